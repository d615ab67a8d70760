//! Transcode stage: jobs, the worker pool, and the production encoder.

mod encoder;
mod job;
mod pool;

pub use encoder::Encoder;
pub use job::Job;
pub use pool::{JobHandler, JobOutcome, JobQueue, PoolSummary, TranscodePool, WorkerFault};
