//! Error types for discforge-av.

use crate::makemkv::LicenseProblem;
use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while driving the external tools.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool is not available.
    #[error("missing executable: {tool}")]
    ToolNotFound { tool: String },

    /// An external tool could not be run to completion.
    #[error("tool execution failed: {tool}: {message}")]
    ToolFailed { tool: String, message: String },

    /// The extraction tool exited with a nonzero status.
    #[error("extraction failed: exit code {code}")]
    ExtractionFailed { code: i32 },

    /// The extraction tool reported success but wrote no container file.
    #[error("extraction finished but no output file was found in {}", dir.display())]
    MissingOutput { dir: PathBuf },

    /// The extraction tool refused to run because of its license state.
    #[error("license check failed: {0}")]
    License(LicenseProblem),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool execution failed error.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a missing output error.
    pub fn missing_output(dir: impl Into<PathBuf>) -> Self {
        Self::MissingOutput { dir: dir.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::tool_not_found("HandBrakeCLI").to_string(),
            "missing executable: HandBrakeCLI"
        );
        assert_eq!(
            Error::ExtractionFailed { code: 12 }.to_string(),
            "extraction failed: exit code 12"
        );
        assert!(Error::missing_output("/raw/DISC")
            .to_string()
            .contains("/raw/DISC"));
        assert!(Error::License(LicenseProblem::OutdatedVersion)
            .to_string()
            .starts_with("license check failed"));
    }
}
