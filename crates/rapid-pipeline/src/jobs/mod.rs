//! Durable background jobs for folder workloads

mod queue;
mod store;
mod worker;

pub use queue::{
    FolderJobOptions, FolderJobPayload, JobEvent, JobEventKind, JobQueue, JobStatusReport,
    QueuedJob,
};
pub use store::{JobRecord, JobStatus, JobStore, MemoryJobStore};
pub use worker::JobWorker;
