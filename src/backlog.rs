//! Backlog mode: transcode raw files left behind by earlier runs.
//!
//! Walks `raw_dir/<label>/*.mkv` and queues every file whose delivery file
//! does not exist yet. Nothing is extracted; the drive is not touched.

use anyhow::{Context, Result};
use chrono::Local;
use discforge_av::handbrake::{delivery_path, is_hardware_codec};
use discforge_common::paths::is_container_file;
use discforge_common::{console, Error, SessionLog};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use walkdir::WalkDir;

use crate::config::Config;
use crate::encode::{Job, JobHandler, PoolSummary, TranscodePool};

/// Pause before a backlog run that would transcode on the CPU.
pub const CPU_CODEC_PAUSE: Duration = Duration::from_secs(5);

/// Collect pending raw files, grouped per label directory.
///
/// Every job of one label shares `batch_encode_YYYYMMDD.log` in that
/// label's raw directory.
pub fn find_pending(config: &Config) -> Vec<Job> {
    let raw_dir = &config.paths.raw_dir;
    let container = config.encoder.container();
    let log_name = format!("batch_encode_{}.log", Local::now().format("%Y%m%d"));

    WalkDir::new(raw_dir)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable backlog entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_container_file(entry.path()))
        .filter_map(|entry| {
            let source = entry.into_path();
            let label_dir = source.parent()?.to_path_buf();
            let label = label_dir.file_name()?.to_string_lossy().to_string();

            let expected = delivery_path(&config.paths.encoded_dir, &label, &source, container);
            if expected.exists() {
                tracing::debug!("Already encoded: {}", expected.display());
                return None;
            }

            let log = SessionLog::new(label_dir.join(&log_name));
            Some(Job::new(source, label, log))
        })
        .collect()
}

/// Queue every pending raw file and wait until all of them are processed.
pub async fn run_backlog(
    config: &Config,
    handler: Arc<dyn JobHandler>,
    cpu_pause: Duration,
) -> Result<PoolSummary> {
    let raw_dir: &Path = &config.paths.raw_dir;
    if !raw_dir.is_dir() {
        return Err(Error::not_found(raw_dir)).context("Raw directory not found");
    }

    if !is_hardware_codec(&config.encoder.video_codec) {
        console(format!(
            "WARNING: video_codec is '{}', which encodes on the CPU. Starting in {}s...",
            config.encoder.video_codec,
            cpu_pause.as_secs()
        ));
        tokio::time::sleep(cpu_pause).await;
    }

    console(format!("Scanning {} for un-encoded files...", raw_dir.display()));
    let jobs = find_pending(config);

    if jobs.is_empty() {
        console("No pending raw files found. Everything looks encoded!");
        return Ok(PoolSummary::default());
    }

    let pool = TranscodePool::start(config.encoder.workers, handler);
    let queued = jobs.len();
    for job in jobs {
        console(format!("Queuing: {} / {}", job.disc_label, job.file_name()));
        pool.enqueue(job);
    }

    console(format!("Queued {queued} files. Processing..."));
    let summary = pool.shutdown().await;
    console(format!(
        "Batch processing complete. {} encoded, {} failed, {} faulted.",
        summary.encoded, summary.failed, summary.faulted
    ));

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config_for(root: &Path) -> Config {
        let mut config = Config::default();
        config.paths.raw_dir = root.join("raw");
        config.paths.encoded_dir = root.join("encoded");
        config
    }

    #[test]
    fn test_find_pending_skips_encoded_and_foreign_files() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_for(tmp.path());

        let disc = config.paths.raw_dir.join("DISC");
        fs::create_dir_all(&disc).unwrap();
        fs::write(disc.join("DISC_t01.mkv"), b"a").unwrap();
        fs::write(disc.join("DISC_t02.mkv"), b"b").unwrap();
        fs::write(disc.join("log_20250101_120000.txt"), b"").unwrap();
        fs::write(config.paths.raw_dir.join("stray.mkv"), b"").unwrap();

        let done = config.paths.encoded_dir.join("DISC");
        fs::create_dir_all(&done).unwrap();
        fs::write(done.join("DISC_t02.mp4"), b"x").unwrap();

        let jobs = find_pending(&config);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].file_name(), "DISC_t01.mkv");
        assert_eq!(jobs[0].disc_label, "DISC");

        let log_name = jobs[0].log.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(log_name.starts_with("batch_encode_") && log_name.ends_with(".log"));
        assert_eq!(jobs[0].log.path().parent(), Some(disc.as_path()));
    }

    #[test]
    fn test_find_pending_empty_raw_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_for(tmp.path());
        assert!(find_pending(&config).is_empty());
    }
}
