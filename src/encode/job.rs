use discforge_common::{SessionLog, TitleDescriptor};
use std::path::PathBuf;

/// One extracted container file awaiting transcode.
#[derive(Debug, Clone)]
pub struct Job {
    /// Extracted container file. Deleted after a verified transcode unless
    /// raw files are kept.
    pub source_path: PathBuf,
    /// Sanitized disc label; groups delivery files.
    pub disc_label: String,
    /// Session log shared by every job from the same disc.
    pub log: SessionLog,
    /// Catalog entry the file was extracted from, when known.
    pub title: Option<TitleDescriptor>,
}

impl Job {
    pub fn new(source_path: impl Into<PathBuf>, disc_label: impl Into<String>, log: SessionLog) -> Self {
        Self {
            source_path: source_path.into(),
            disc_label: disc_label.into(),
            log,
            title: None,
        }
    }

    pub fn with_title(mut self, title: TitleDescriptor) -> Self {
        self.title = Some(title);
        self
    }

    /// Source file name for console and log lines.
    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source_path.to_string_lossy().to_string())
    }
}

/// Element of the worker queue.
#[derive(Debug)]
pub(crate) enum QueueItem {
    Job(Box<Job>),
    /// Poison value: the receiving worker exits after its current item.
    Stop,
}
