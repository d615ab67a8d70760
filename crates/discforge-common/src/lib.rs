//! Discforge-Common: shared types, constants, and utilities.
//!
//! This crate provides common functionality used across discforge:
//!
//! - **Title descriptors**: the record that carries both the extraction tool's
//!   native title index and the user-facing filtered index
//! - **Path utilities**: filename sanitising and container file detection
//! - **Output**: the single serialization point for console and log writes
//! - **Error handling**: common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use discforge_common::paths::sanitize_filename;
//!
//! assert_eq!(sanitize_filename("MY:DISC/1"), "MY_DISC_1");
//! ```

pub mod error;
pub mod output;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use output::{console, SessionLog};
pub use types::*;
