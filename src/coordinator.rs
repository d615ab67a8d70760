//! Pipeline coordinator.
//!
//! Runs the outer loop `WaitingForDisc -> SessionActive -> WaitingForRemoval`.
//! Extraction happens here, one title at a time, because the drive is a
//! single exclusive resource; every extracted file is handed to the
//! [`TranscodePool`] and transcoded in the background while the drive moves
//! on to the next title.

use anyhow::Context;
use discforge_av::MakeMkv;
use discforge_common::console;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::drive::DiscDrive;
use crate::encode::{Job, JobQueue, PoolSummary, TranscodePool, WorkerFault};
use crate::selection::{parse_selection, TitleSelector};
use crate::session::DiscSession;

/// Coordinator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    WaitingForDisc,
    SessionActive,
    WaitingForRemoval,
}

/// How a disc session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The catalog was empty.
    NoTitles,
    /// The selection matched no title.
    NothingSelected,
    /// Every chosen title was attempted, or a stop was requested between
    /// extractions.
    Completed { extracted: usize, failed: usize },
    /// A stop was requested while waiting for the selection.
    Interrupted,
}

/// Coordinator timing and policy, taken from [`Config`].
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub raw_dir: PathBuf,
    pub min_title_length: u64,
    pub eject_on_completion: bool,
    pub poll_interval: Duration,
    pub fault_delay: Duration,
}

impl From<&Config> for CoordinatorSettings {
    fn from(config: &Config) -> Self {
        Self {
            raw_dir: config.paths.raw_dir.clone(),
            min_title_length: config.catalog.min_title_length,
            eject_on_completion: config.drive.eject_on_completion,
            poll_interval: config.drive.poll_interval(),
            fault_delay: config.drive.fault_delay(),
        }
    }
}

pub struct Coordinator {
    session: Arc<SessionRunner>,
    pool: TranscodePool,
}

/// Everything a disc session needs, shared with the task it runs in.
struct SessionRunner {
    drive: Arc<dyn DiscDrive>,
    makemkv: MakeMkv,
    selector: Arc<dyn TitleSelector>,
    queue: JobQueue,
    settings: CoordinatorSettings,
}

impl Coordinator {
    pub fn new(
        drive: Arc<dyn DiscDrive>,
        makemkv: MakeMkv,
        selector: Arc<dyn TitleSelector>,
        pool: TranscodePool,
        settings: CoordinatorSettings,
    ) -> Self {
        let session = SessionRunner {
            drive,
            makemkv,
            selector,
            queue: pool.queue(),
            settings,
        };
        Self {
            session: Arc::new(session),
            pool,
        }
    }

    /// Run until `cancel` fires, then drain and join the worker pool.
    ///
    /// An extraction that is already running is allowed to finish.
    pub async fn run(self, cancel: CancellationToken) -> PoolSummary {
        let drive = self.session.drive.clone();
        let settings = &self.session.settings;

        console(format!(
            "Active with {} transcode workers. Waiting for discs in {}...",
            self.pool.worker_count(),
            drive.device()
        ));

        let mut state = CoordinatorState::WaitingForDisc;

        while !cancel.is_cancelled() {
            tracing::trace!(?state, "Coordinator step");

            state = match state {
                CoordinatorState::WaitingForDisc => {
                    if drive.is_present().await {
                        CoordinatorState::SessionActive
                    } else {
                        pause(settings.poll_interval, &cancel).await;
                        CoordinatorState::WaitingForDisc
                    }
                }
                CoordinatorState::SessionActive => match self.run_session_contained(&cancel).await {
                    Ok(outcome) => {
                        tracing::info!(?outcome, "Disc session finished");
                        CoordinatorState::WaitingForRemoval
                    }
                    Err(e) => {
                        // Abandoned: no rescan until the disc is removed.
                        console(format!("SESSION ERROR: {e:#}"));
                        tracing::error!("Disc session abandoned: {e:#}");
                        drive.eject().await;
                        pause(settings.fault_delay, &cancel).await;
                        CoordinatorState::WaitingForRemoval
                    }
                },
                CoordinatorState::WaitingForRemoval => {
                    if drive.is_present().await {
                        pause(settings.poll_interval, &cancel).await;
                        CoordinatorState::WaitingForRemoval
                    } else {
                        console("Disc removed.");
                        CoordinatorState::WaitingForDisc
                    }
                }
            };
        }

        console("Stopping: waiting for queued transcodes to finish...");
        let summary = self.pool.shutdown().await;
        console(format!(
            "Stopped. {} encoded, {} failed, {} faulted.",
            summary.encoded, summary.failed, summary.faulted
        ));
        summary
    }

    /// Process the disc currently in the drive.
    ///
    /// Per-title extraction failures are logged and skipped. An `Err` means
    /// the session itself could not proceed and should be abandoned.
    pub async fn run_session(&self, cancel: &CancellationToken) -> anyhow::Result<SessionOutcome> {
        self.session.run(cancel).await
    }

    /// [`Self::run_session`] in its own task, so a panic anywhere in the
    /// session surfaces as an `Err` instead of unwinding the coordinator.
    async fn run_session_contained(&self, cancel: &CancellationToken) -> anyhow::Result<SessionOutcome> {
        let session = self.session.clone();
        let cancel = cancel.clone();

        match tokio::spawn(async move { session.run(&cancel).await }).await {
            Ok(result) => result,
            Err(e) => Err(anyhow::anyhow!("session task {}", WorkerFault::from(e))),
        }
    }
}

impl SessionRunner {
    async fn run(&self, cancel: &CancellationToken) -> anyhow::Result<SessionOutcome> {
        let device = self.drive.device();
        let volume_label = self.drive.volume_label().await;

        let catalog = self
            .makemkv
            .resolve(device, &volume_label, self.settings.min_title_length)
            .await;

        let session = DiscSession::open(&self.settings.raw_dir, &catalog.disc_label)
            .with_context(|| format!("Cannot prepare session for {}", catalog.disc_label))?;
        let log = session.log();

        console(format!("Disc found: {}", session.label()));
        log.append_line(format!(
            "SESSION START {} ({} titles)",
            session.label(),
            catalog.titles.len()
        ));

        if catalog.is_empty() {
            console("No valid titles found.");
            log.append_line("NO TITLES");
            self.finish_disc().await;
            return Ok(SessionOutcome::NoTitles);
        }

        let expression = tokio::select! {
            expression = self.selector.select(session.label(), &catalog.titles) => expression,
            _ = cancel.cancelled() => return Ok(SessionOutcome::Interrupted),
        };

        let chosen = parse_selection(&expression, &catalog.filtered_indices());
        if chosen.is_empty() {
            console("Selection skipped.");
            log.append_line(format!("SELECTION EMPTY '{}'", expression.trim()));
            self.finish_disc().await;
            return Ok(SessionOutcome::NothingSelected);
        }
        log.append_line(format!("SELECTED {chosen:?}"));

        let mut extracted = 0;
        let mut failed = 0;

        for index in chosen {
            if cancel.is_cancelled() {
                console("Stop requested; remaining titles skipped.");
                break;
            }
            let Some(title) = catalog.by_filtered_index(index) else {
                continue;
            };

            match self
                .makemkv
                .extract(device, session.raw_dir(), title, log)
                .await
            {
                Ok(path) => {
                    extracted += 1;
                    self.queue.enqueue(
                        Job::new(path, session.safe_label(), log.clone()).with_title(title.clone()),
                    );
                }
                Err(e) => {
                    failed += 1;
                    console(format!("RIP ERROR on title {index}: {e}"));
                    log.append_line(format!("RIP FAIL t{:02}: {e}", title.native_index));
                }
            }
        }

        if self.settings.eject_on_completion {
            console("Ripping complete. Ejecting...");
        }
        self.finish_disc().await;

        Ok(SessionOutcome::Completed { extracted, failed })
    }

    async fn finish_disc(&self) {
        if self.settings.eject_on_completion {
            self.drive.eject().await;
        }
    }
}

async fn pause(duration: Duration, cancel: &CancellationToken) {
    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        _ = cancel.cancelled() => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.catalog.min_title_length = 120;
        config.drive.poll_interval_secs = 7;
        config.drive.eject_on_completion = false;

        let settings = CoordinatorSettings::from(&config);
        assert_eq!(settings.min_title_length, 120);
        assert_eq!(settings.poll_interval, Duration::from_secs(7));
        assert_eq!(settings.fault_delay, Duration::from_secs(5));
        assert!(!settings.eject_on_completion);
    }
}
