//! Job queue: enqueue, status lookup, and progress events

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::ai::{FolderAiOptions, ProcessingMode};
use crate::config::QueueConfig;
use crate::error::{Error, Result};
use crate::types::{FolderStructure, OutputFormat};

use super::store::{JobRecord, JobStatus, JobStore};

/// Work description for a background folder job
#[derive(Debug, Clone, Deserialize)]
pub struct FolderJobPayload {
    /// User instruction
    pub prompt: String,
    /// Optional template name resolved through the template store
    #[serde(default)]
    pub template: Option<String>,
    /// Folder structure to process
    pub folder_structure: FolderStructure,
    /// Processing options
    #[serde(default)]
    pub options: FolderJobOptions,
}

/// Options controlling a folder job
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderJobOptions {
    /// Combined or individual dispatch
    #[serde(default)]
    pub processing_mode: ProcessingMode,
    /// Output rendering format
    #[serde(default)]
    pub output_format: OutputFormat,
    /// Persist results after the AI call
    #[serde(default)]
    pub save_output: bool,
    /// Destination directory for persisted results
    #[serde(default)]
    pub output_destination: Option<PathBuf>,
}

impl FolderJobOptions {
    pub(crate) fn to_ai_options(&self, combine: crate::config::CombineConfig) -> FolderAiOptions {
        FolderAiOptions {
            mode: self.processing_mode,
            output_format: self.output_format,
            combine,
        }
    }
}

/// Event published to subscribers, keyed by job id
#[derive(Debug, Clone, Serialize)]
pub struct JobEvent {
    pub job_id: Uuid,
    #[serde(flatten)]
    pub kind: JobEventKind,
}

/// What happened to the job
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobEventKind {
    Progress { progress: u8 },
    Completed,
    Failed { error: String },
}

/// Status lookup response. Unknown ids are a distinct status, not an error.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum JobStatusReport {
    NotFound {
        status: &'static str,
    },
    Found {
        id: Uuid,
        status: JobStatus,
        progress: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        attempts_made: u32,
    },
}

/// Queued unit handed to the worker
#[derive(Debug)]
pub struct QueuedJob {
    pub id: Uuid,
    pub payload: FolderJobPayload,
}

/// Job queue owning the store handle and the worker channel
pub struct JobQueue {
    store: Arc<dyn JobStore>,
    sender: mpsc::Sender<QueuedJob>,
    events: broadcast::Sender<JobEvent>,
}

impl JobQueue {
    /// Create a queue over the given store. The returned receiver feeds a
    /// [`super::JobWorker`].
    pub fn new(
        store: Arc<dyn JobStore>,
        config: &QueueConfig,
    ) -> (Self, mpsc::Receiver<QueuedJob>) {
        let (sender, receiver) = mpsc::channel(config.capacity.max(1));
        let (events, _) = broadcast::channel(256);

        (
            Self {
                store,
                sender,
                events,
            },
            receiver,
        )
    }

    /// Enqueue a folder job. The record is created before the send so a
    /// status lookup immediately after enqueue always resolves.
    pub async fn enqueue(&self, payload: FolderJobPayload) -> Result<JobRecord> {
        let record = JobRecord::new(Uuid::new_v4());
        let id = record.id;
        self.store.insert(record.clone());

        self.sender
            .send(QueuedJob { id, payload })
            .await
            .map_err(|e| {
                self.store.update(id, &mut |r| {
                    r.status = JobStatus::Failed;
                    r.error = Some("Queue is closed".to_string());
                });
                Error::internal(format!("Failed to enqueue job: {}", e))
            })?;

        tracing::info!("Job {} queued", id);
        Ok(record)
    }

    /// Look up job status by id
    pub fn status(&self, id: Uuid) -> JobStatusReport {
        match self.store.get(id) {
            Some(record) => JobStatusReport::Found {
                id: record.id,
                status: record.status,
                progress: record.progress,
                result: record.result,
                error: record.error,
                attempts_made: record.attempts_made,
            },
            None => JobStatusReport::NotFound {
                status: "not-found",
            },
        }
    }

    /// All known jobs, newest first
    pub fn list(&self) -> Vec<JobRecord> {
        self.store.list()
    }

    /// Subscribe to progress, completion, and failure events
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Prune completed jobs, retaining failed ones for inspection
    pub fn sweep_completed(&self) -> usize {
        self.store.sweep_completed()
    }

    fn publish(&self, event: JobEvent) {
        // No subscribers is fine; events are best effort
        let _ = self.events.send(event);
    }

    /// Mark a job active for the given attempt
    pub(crate) fn mark_active(&self, id: Uuid, attempt: u32) {
        self.store.update(id, &mut |record| {
            record.status = JobStatus::Active;
            record.attempts_made = attempt;
        });
    }

    /// Raise the job's progress. Progress never decreases, so checkpoints
    /// replayed by a retry keep the highest value already reported.
    pub(crate) fn set_progress(&self, id: Uuid, progress: u8) {
        let mut reported = 0;
        self.store.update(id, &mut |record| {
            if !record.status.is_terminal() {
                record.progress = record.progress.max(progress.min(100));
            }
            reported = record.progress;
        });
        self.publish(JobEvent {
            job_id: id,
            kind: JobEventKind::Progress { progress: reported },
        });
    }

    /// Settle a job as completed
    pub(crate) fn complete(&self, id: Uuid, result: Value) {
        self.store.update(id, &mut |record| {
            record.status = JobStatus::Completed;
            record.progress = 100;
            record.result = Some(result.clone());
            record.error = None;
        });
        self.publish(JobEvent {
            job_id: id,
            kind: JobEventKind::Completed,
        });
        tracing::info!("Job {} completed", id);
    }

    /// Settle a job as failed after its final attempt
    pub(crate) fn fail(&self, id: Uuid, error: String) {
        self.store.update(id, &mut |record| {
            record.status = JobStatus::Failed;
            record.error = Some(error.clone());
        });
        self.publish(JobEvent {
            job_id: id,
            kind: JobEventKind::Failed { error },
        });
        tracing::error!("Job {} failed", id);
    }
}
