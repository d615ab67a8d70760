//! External tool detection.

use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Executable names tried for the extraction tool, in order.
pub const MAKEMKV_NAMES: &[&str] = &["makemkvcon64", "makemkvcon"];

/// Executable names tried for the transcode tool, in order.
pub const HANDBRAKE_NAMES: &[&str] = &["HandBrakeCLI"];

/// Information about an external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
///
/// The configured path is used only if it exists; otherwise each candidate
/// name is looked up in `PATH` in order.
///
/// # Errors
///
/// Returns [`Error::ToolNotFound`] naming the first candidate if nothing is
/// found.
pub fn resolve_tool(candidates: &[&str], config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(
            "Configured tool path does not exist, searching PATH: {}",
            path.display()
        );
    }

    candidates
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or_else(|| Error::tool_not_found(candidates.first().copied().unwrap_or("<unnamed>")))
}

/// Resolve a tool and, if `version_arg` is given, read the first line its
/// version command prints.
pub fn inspect_tool(
    candidates: &[&str],
    config_path: Option<&Path>,
    version_arg: Option<&str>,
) -> ToolInfo {
    let name = candidates.first().copied().unwrap_or("<unnamed>").to_string();

    match resolve_tool(candidates, config_path) {
        Ok(path) => {
            let version = version_arg.and_then(|arg| detect_version(&path, arg));
            ToolInfo {
                name,
                available: true,
                version,
                path: Some(path),
            }
        }
        Err(_) => ToolInfo {
            name,
            available: false,
            version: None,
            path: None,
        },
    }
}

fn detect_version(path: &Path, version_arg: &str) -> Option<String> {
    let output = Command::new(path).arg(version_arg).output().ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .find(|l| !l.trim().is_empty())
        .map(|s| s.trim().to_string())
}
