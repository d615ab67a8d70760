//! Discforge - unattended optical disc extraction and transcode pipeline
//!
//! This library crate exposes the pipeline for the binary and for
//! integration testing.

pub mod backlog;
pub mod config;
pub mod coordinator;
pub mod drive;
pub mod encode;
pub mod selection;
pub mod session;
pub mod setup;
