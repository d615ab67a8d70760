//! Core types shared by the catalog resolver, the extraction stage, and the
//! transcode workers.

use serde::{Deserialize, Serialize};

/// One rippable segment on a disc.
///
/// A title carries two indices. `native_index` is the extraction tool's own
/// addressing and is the only index ever passed back to the tool.
/// `filtered_index` is dense over the titles that survived the minimum
/// duration filter and is only used for display and selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleDescriptor {
    /// Index as reported and required by the extraction tool.
    pub native_index: u32,
    /// 0-based index among retained titles, in ascending native order.
    pub filtered_index: usize,
    /// Parsed duration; 0 when the duration field was unparseable.
    pub duration_seconds: u64,
    /// Duration exactly as the tool printed it.
    pub length_label: String,
    /// Size exactly as the tool printed it (e.g. "24.3 GB").
    pub size_label: String,
    /// Sanitized disc label plus a `_tNN` native index hint.
    pub display_name: String,
}

impl TitleDescriptor {
    /// Duration rendered as `H:MM:SS`.
    pub fn duration_hms(&self) -> String {
        let secs = self.duration_seconds;
        format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
    }
}
