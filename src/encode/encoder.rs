use anyhow::Context;
use async_trait::async_trait;
use discforge_av::handbrake::delivery_path;
use discforge_av::{EncodeSettings, HandBrake};
use discforge_common::console;
use discforge_common::paths::ensure_dir;
use std::path::{Path, PathBuf};

use super::job::Job;
use super::pool::{JobHandler, JobOutcome};
use crate::config::Config;

/// Production job handler: transcodes one extracted file and disposes of
/// the source once the delivery file is verified.
#[derive(Debug, Clone)]
pub struct Encoder {
    handbrake: HandBrake,
    settings: EncodeSettings,
    encoded_dir: PathBuf,
    keep_raw_files: bool,
    min_output_bytes: u64,
}

impl Encoder {
    pub fn new(handbrake: HandBrake, config: &Config) -> Self {
        Self {
            handbrake,
            settings: config.encoder.settings(),
            encoded_dir: config.paths.encoded_dir.clone(),
            keep_raw_files: config.encoder.keep_raw_files,
            min_output_bytes: config.encoder.min_output_bytes,
        }
    }

    /// Where `job` will be delivered.
    pub fn output_path(&self, job: &Job) -> PathBuf {
        delivery_path(
            &self.encoded_dir,
            &job.disc_label,
            &job.source_path,
            self.settings.container,
        )
    }

    /// Delete the source if the delivery file exists and is larger than
    /// the sanity threshold. Returns whether the source was removed.
    fn dispose_source(&self, job: &Job, output: &Path) -> bool {
        if self.keep_raw_files {
            return false;
        }

        let size = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
        if size <= self.min_output_bytes {
            let message = format!(
                "ENC OUTPUT SUSPECT: {} is {size} bytes; keeping {}",
                output.display(),
                job.file_name()
            );
            console(&message);
            job.log.append_line(&message);
            return false;
        }

        match std::fs::remove_file(&job.source_path) {
            Ok(()) => {
                job.log
                    .append_line(format!("RAW REMOVED {}", job.source_path.display()));
                true
            }
            Err(e) => {
                tracing::warn!("Could not remove {}: {e}", job.source_path.display());
                false
            }
        }
    }
}

#[async_trait]
impl JobHandler for Encoder {
    async fn handle(&self, job: &Job) -> anyhow::Result<JobOutcome> {
        let output = self.output_path(job);
        if let Some(parent) = output.parent() {
            ensure_dir(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let name = job.file_name();
        match &job.title {
            Some(title) => console(format!(
                "Encoding: {name} (title {}, {})",
                title.filtered_index,
                title.duration_hms()
            )),
            None => console(format!("Encoding: {name}")),
        }
        job.log
            .append_line(format!("ENC START {}", job.source_path.display()));

        let code = self
            .handbrake
            .transcode(&self.settings, &job.source_path, &output, &job.log)
            .await;

        if code != 0 {
            console(format!("Failed: {name}"));
            job.log.append_line(format!("ENC FAIL rc={code}"));
            return Ok(JobOutcome::Failed { code });
        }

        let file = output
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        console(format!("Finished: {file}"));
        job.log.append_line(format!("ENC SUCCESS {}", output.display()));

        let source_removed = self.dispose_source(job, &output);
        Ok(JobOutcome::Encoded { source_removed })
    }
}
