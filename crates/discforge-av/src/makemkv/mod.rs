//! Extraction tool adapter.
//!
//! [`MakeMkv`] wraps the extraction executable: a read-only scan that yields
//! the title catalog, a license probe run at startup, and per-title
//! extraction into a container file.
//!
//! Every invocation passes `--minlength=0` so the tool numbers titles by
//! their native index. Length filtering is done by [`build_catalog`], never
//! by the tool, because the tool renumbers titles when it filters.

mod catalog;
mod extract;
mod license;
mod report;

pub use catalog::{build_catalog, is_duration, is_size, parse_duration};
pub use extract::locate_output;
pub use license::{check_messages, tool_version, LicenseProblem, LicenseStatus};
pub use report::{DriveEntry, Message, RawTitle, Report, DISC_NAME_CODE, DURATION_CODE, SIZE_CODE};

use discforge_common::paths::UNLABELED_DISC;
use discforge_common::TitleDescriptor;
use serde::Serialize;
use std::path::PathBuf;

use crate::{Error, Result, ToolCommand};

/// Pseudo-source that makes the tool list drives without touching a disc.
const DRIVE_LIST_SOURCE: &str = "disc:9999";

/// Titles retained from one scan, with the label they were named after.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    /// Volume label, else the disc name from the report, else
    /// [`UNLABELED_DISC`]. Never empty.
    pub disc_label: String,
    pub titles: Vec<TitleDescriptor>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Every selectable `filtered_index`.
    pub fn filtered_indices(&self) -> Vec<usize> {
        self.titles.iter().map(|t| t.filtered_index).collect()
    }

    /// Look a title up by its user-facing index.
    pub fn by_filtered_index(&self, index: usize) -> Option<&TitleDescriptor> {
        self.titles.iter().find(|t| t.filtered_index == index)
    }
}

/// Handle on the extraction executable.
#[derive(Debug, Clone)]
pub struct MakeMkv {
    program: PathBuf,
}

impl MakeMkv {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    /// Arguments for a read-only scan of `device`.
    pub fn scan_args(device: &str) -> Vec<String> {
        vec![
            "-r".into(),
            "--cache=1".into(),
            "--minlength=0".into(),
            "info".into(),
            format!("dev:{device}"),
        ]
    }

    /// Run the scan and parse the report.
    ///
    /// # Errors
    ///
    /// Fails if the tool cannot be run or exits nonzero.
    pub async fn scan_report(&self, device: &str) -> Result<Report> {
        let output = ToolCommand::new(self.program.clone())
            .args(Self::scan_args(device))
            .execute()
            .await?;

        if !output.status.success() {
            return Err(Error::tool_failed(
                "makemkvcon",
                format!("scan exited with code {}", output.code()),
            ));
        }

        Ok(Report::parse(&output.stdout))
    }

    /// Resolve the title catalog of the disc in `device`.
    ///
    /// Never fails: a tool error or an unparseable report yields an empty
    /// catalog, which callers treat as "no usable content". When
    /// `volume_label` is empty the disc name from the report is used.
    pub async fn resolve(&self, device: &str, volume_label: &str, min_title_length: u64) -> Catalog {
        let report = match self.scan_report(device).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("Title scan of {device} failed: {e}");
                return Catalog {
                    disc_label: label_or_default(volume_label, None),
                    titles: Vec::new(),
                };
            }
        };

        let disc_label = label_or_default(volume_label, report.disc_name.as_deref());
        let titles = build_catalog(&report, &disc_label, min_title_length);
        tracing::info!(
            "Scan of {device}: {} titles reported, {} retained (min {}s)",
            report.titles.len(),
            titles.len(),
            min_title_length
        );

        Catalog { disc_label, titles }
    }

    /// Probe the tool's license state without touching any disc.
    ///
    /// # Errors
    ///
    /// - [`Error::License`] if the tool reports an expired evaluation, an
    ///   invalid key, or an outdated version.
    /// - [`Error::ToolNotFound`] / [`Error::ToolFailed`] if it cannot run.
    pub async fn check_license(&self) -> Result<LicenseStatus> {
        let output = ToolCommand::new(self.program.clone())
            .args(["-r", "--cache=1", "info", DRIVE_LIST_SOURCE])
            .execute()
            .await?;

        let report = Report::parse(&output.stdout);
        check_messages(&report.messages).map_err(Error::License)?;

        if !output.status.success() {
            tracing::warn!(
                "makemkvcon drive listing exited with code {}",
                output.code()
            );
        }

        Ok(LicenseStatus {
            version: tool_version(&report.messages),
            drives: report.drives,
        })
    }
}

fn label_or_default(volume_label: &str, disc_name: Option<&str>) -> String {
    [Some(volume_label), disc_name]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|label| !label.is_empty())
        .unwrap_or(UNLABELED_DISC)
        .to_string()
}
