//! One physical disc's processing cycle.

use chrono::Local;
use discforge_common::paths::{ensure_dir, sanitize_filename};
use discforge_common::{Result, SessionLog};
use std::path::{Path, PathBuf};

/// Label, working directory, and shared log for the disc in the drive.
///
/// The log outlives the session: it is only ever appended to.
#[derive(Debug, Clone)]
pub struct DiscSession {
    label: String,
    safe_label: String,
    raw_dir: PathBuf,
    log: SessionLog,
}

impl DiscSession {
    /// Create `raw_root/<safe label>/` and name a fresh
    /// `log_YYYYMMDD_HHMMSS.txt` inside it.
    pub fn open(raw_root: &Path, label: &str) -> Result<Self> {
        let safe_label = sanitize_filename(label);
        let raw_dir = raw_root.join(&safe_label);
        ensure_dir(&raw_dir)?;

        let log_name = format!("log_{}.txt", Local::now().format("%Y%m%d_%H%M%S"));
        let log = SessionLog::new(raw_dir.join(log_name));

        Ok(Self {
            label: label.to_string(),
            safe_label,
            raw_dir,
            log,
        })
    }

    /// Label as reported by the drive or the disc.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Label as used in paths.
    pub fn safe_label(&self) -> &str {
        &self.safe_label
    }

    /// Destination directory for extracted titles.
    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }
}
