//! Fixed-size transcode worker pool.
//!
//! Workers share one FIFO queue. Each job runs in its own task so an error
//! or a panic is contained at the job boundary: it is logged as a critical
//! worker fault and the worker moves on to the next item. A worker only
//! exits when it dequeues [`QueueItem::Stop`].

use async_trait::async_trait;
use discforge_common::console;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinError, JoinHandle};

use super::job::{Job, QueueItem};

/// Result of a job that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The transcode tool exited zero.
    Encoded { source_removed: bool },
    /// The transcode tool exited nonzero; the source is retained.
    Failed { code: i32 },
}

/// Processes one job. Implemented by [`super::Encoder`] in production.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn handle(&self, job: &Job) -> anyhow::Result<JobOutcome>;
}

/// A job that neither completed nor reported a tool failure.
#[derive(Debug, thiserror::Error)]
pub enum WorkerFault {
    #[error("{0:#}")]
    Failed(anyhow::Error),

    #[error("panicked: {0}")]
    Panicked(String),

    #[error("job task cancelled")]
    Cancelled,
}

impl From<JoinError> for WorkerFault {
    fn from(err: JoinError) -> Self {
        if !err.is_panic() {
            return WorkerFault::Cancelled;
        }
        let payload = err.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        WorkerFault::Panicked(message)
    }
}

/// Per-pool job counters.
#[derive(Debug, Default)]
struct Counters {
    encoded: AtomicUsize,
    failed: AtomicUsize,
    faulted: AtomicUsize,
}

/// Totals reported when the pool shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSummary {
    pub encoded: usize,
    pub failed: usize,
    pub faulted: usize,
}

/// Cloneable producer side of a [`TranscodePool`] queue.
#[derive(Debug, Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<QueueItem>,
}

impl JobQueue {
    /// Queue a job. Never blocks.
    pub fn enqueue(&self, job: Job) {
        self.queue.enqueue(job);
    }

    /// A producer handle that can be moved into other tasks.
    pub fn queue(&self) -> JobQueue {
        self.queue.clone()
    }
}

/// Handle on a running worker pool.
pub struct TranscodePool {
    queue: JobQueue,
    workers: Vec<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl TranscodePool {
    /// Spawn `workers` long-lived workers (at least one).
    pub fn start(workers: usize, handler: Arc<dyn JobHandler>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let receiver = Arc::new(Mutex::new(receiver));
        let counters = Arc::new(Counters::default());

        let workers = (0..workers.max(1))
            .map(|id| {
                tokio::spawn(worker_loop(
                    id,
                    receiver.clone(),
                    handler.clone(),
                    counters.clone(),
                ))
            })
            .collect();

        Self {
            queue: JobQueue { sender },
            workers,
            counters,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queue a job. Never blocks.
    pub fn enqueue(&self, job: Job) {
        self.queue.enqueue(job);
    }

    /// A producer handle that can be moved into other tasks.
    pub fn queue(&self) -> JobQueue {
        self.queue.clone()
    }

    /// Let queued jobs finish, then stop every worker and wait for it.
    pub async fn shutdown(self) -> PoolSummary {
        for _ in 0..self.workers.len() {
            let _ = self.queue.sender.send(QueueItem::Stop);
        }

        for handle in self.workers {
            if let Err(e) = handle.await {
                tracing::error!("Transcode worker ended abnormally: {e}");
            }
        }

        PoolSummary {
            encoded: self.counters.encoded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            faulted: self.counters.faulted.load(Ordering::Relaxed),
        }
    }
}

async fn worker_loop(
    id: usize,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<QueueItem>>>,
    handler: Arc<dyn JobHandler>,
    counters: Arc<Counters>,
) {
    tracing::debug!(worker = id, "Transcode worker started");

    loop {
        let item = receiver.lock().await.recv().await;
        let job = match item {
            Some(QueueItem::Job(job)) => job,
            Some(QueueItem::Stop) | None => break,
        };

        match run_contained(handler.clone(), *job).await {
            Ok(JobOutcome::Encoded { .. }) => {
                counters.encoded.fetch_add(1, Ordering::Relaxed);
            }
            Ok(JobOutcome::Failed { .. }) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                counters.faulted.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    tracing::debug!(worker = id, "Transcode worker stopped");
}

/// Run one job in its own task and log any fault against the job's source.
async fn run_contained(handler: Arc<dyn JobHandler>, job: Job) -> Result<JobOutcome, WorkerFault> {
    let name = job.file_name();
    let log = job.log.clone();

    let result = match tokio::spawn(async move { handler.handle(&job).await }).await {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(e)) => Err(WorkerFault::Failed(e)),
        Err(e) => Err(WorkerFault::from(e)),
    };

    if let Err(fault) = &result {
        let message = format!("CRITICAL WORKER FAULT on {name}: {fault}");
        tracing::error!("{message}");
        console(&message);
        log.append_line(&message);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use discforge_common::SessionLog;

    struct Recorder {
        seen: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl JobHandler for Recorder {
        async fn handle(&self, job: &Job) -> anyhow::Result<JobOutcome> {
            let name = job.file_name();
            self.seen.lock().unwrap().push(name.clone());
            match name.as_str() {
                "panic.mkv" => panic!("corrupt input"),
                "error.mkv" => anyhow::bail!("unreadable source"),
                "fail.mkv" => Ok(JobOutcome::Failed { code: 2 }),
                _ => Ok(JobOutcome::Encoded { source_removed: true }),
            }
        }
    }

    #[tokio::test]
    async fn test_panic_payload_is_captured() {
        let err = tokio::spawn(async {
            panic!("boom");
        })
        .await
        .unwrap_err();
        assert_eq!(WorkerFault::from(err).to_string(), "panicked: boom");
    }

    #[tokio::test]
    async fn test_single_worker_survives_faults() {
        let tmp = tempfile::tempdir().unwrap();
        let log = SessionLog::new(tmp.path().join("log.txt"));
        let recorder = Arc::new(Recorder {
            seen: std::sync::Mutex::new(Vec::new()),
        });

        let pool = TranscodePool::start(1, recorder.clone());
        for name in ["panic.mkv", "a.mkv", "error.mkv", "fail.mkv", "b.mkv"] {
            pool.enqueue(Job::new(tmp.path().join(name), "DISC", log.clone()));
        }
        let summary = pool.shutdown().await;

        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec!["panic.mkv", "a.mkv", "error.mkv", "fail.mkv", "b.mkv"]
        );
        assert_eq!(
            summary,
            PoolSummary {
                encoded: 2,
                failed: 1,
                faulted: 2
            }
        );

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("CRITICAL WORKER FAULT on panic.mkv: panicked: corrupt input"));
        assert!(content.contains("CRITICAL WORKER FAULT on error.mkv: unreadable source"));
    }

    #[tokio::test]
    async fn test_zero_workers_starts_one() {
        let recorder = Arc::new(Recorder {
            seen: std::sync::Mutex::new(Vec::new()),
        });
        let pool = TranscodePool::start(0, recorder);
        assert_eq!(pool.worker_count(), 1);
        assert_eq!(pool.shutdown().await, PoolSummary::default());
    }
}
