//! License and capability validation for the extraction tool.
//!
//! The tool reports its license state only as free-text `MSG` records, so
//! classification is by message text.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

use super::report::{DriveEntry, Message};

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"MakeMKV v(\d[\w.\-]*)").expect("static regex"));

/// A license state that prevents the extraction tool from working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LicenseProblem {
    /// The free evaluation period is over.
    EvaluationExpired,
    /// The registration key is invalid, blacklisted, or expired.
    InvalidKey,
    /// The installed version is too old to run.
    OutdatedVersion,
}

impl LicenseProblem {
    /// Classify one message, if it describes a license problem.
    pub fn classify(text: &str) -> Option<Self> {
        let text = text.to_lowercase();

        if text.contains("evaluation") && (text.contains("expired") || text.contains("is over")) {
            Some(Self::EvaluationExpired)
        } else if text.contains("key")
            && ["invalid", "not valid", "expired", "blacklisted"]
                .iter()
                .any(|w| text.contains(w))
        {
            Some(Self::InvalidKey)
        } else if text.contains("too old") || text.contains("outdated") {
            Some(Self::OutdatedVersion)
        } else {
            None
        }
    }
}

impl fmt::Display for LicenseProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EvaluationExpired => write!(
                f,
                "the MakeMKV evaluation period has expired; register a key or install the current beta key"
            ),
            Self::InvalidKey => write!(
                f,
                "the MakeMKV registration key is invalid or expired; enter a valid key in MakeMKV settings"
            ),
            Self::OutdatedVersion => write!(
                f,
                "this MakeMKV version is too old; install the latest release"
            ),
        }
    }
}

/// Result of a successful license check.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LicenseStatus {
    /// Version the tool announced at startup, e.g. `1.17.7`.
    pub version: Option<String>,
    /// Drives the tool can see.
    #[serde(skip)]
    pub drives: Vec<DriveEntry>,
}

/// Return the first license problem found among the messages.
pub fn check_messages(messages: &[Message]) -> Result<(), LicenseProblem> {
    match messages.iter().find_map(|m| LicenseProblem::classify(&m.text)) {
        Some(problem) => Err(problem),
        None => Ok(()),
    }
}

/// Extract the tool version from its startup banner.
pub fn tool_version(messages: &[Message]) -> Option<String> {
    messages
        .iter()
        .find_map(|m| VERSION_RE.captures(&m.text))
        .map(|caps| caps[1].to_string())
}
