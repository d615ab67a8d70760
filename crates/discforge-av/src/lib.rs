//! # discforge-av
//!
//! External tool plumbing for the discforge pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`tools`]) -- locate the extraction and transcode
//!   executables from configured paths or `PATH`.
//! - **Process running** ([`ToolCommand`]) -- spawn a tool with its combined
//!   output appended to a session log, optionally at lowered priority, or
//!   capture its output in memory.
//! - **Extraction tool adapter** ([`makemkv`]) -- scan report parsing, title
//!   catalog resolution, license validation, and title extraction.
//! - **Transcode tool adapter** ([`handbrake`]) -- argument building and
//!   delivery container naming.

mod error;
pub mod command;
pub mod handbrake;
pub mod makemkv;
pub mod tools;

#[cfg(all(test, unix))]
mod test_fixtures;

// Re-exports
pub use command::{Priority, ToolCommand, ToolOutput, FAILED_TO_RUN};
pub use error::{Error, Result};
pub use handbrake::{Container, EncodeSettings, HandBrake};
pub use makemkv::{Catalog, LicenseProblem, LicenseStatus, MakeMkv};
pub use tools::{inspect_tool, resolve_tool, ToolInfo};
