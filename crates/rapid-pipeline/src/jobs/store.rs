//! Job records and the store they live in
//!
//! The queue owns its store and reaches it only through the [`JobStore`]
//! handle, so the in-memory default can be swapped for a durable backing
//! without touching pipeline logic. Exactly-once claim semantics across
//! processes are the backing store's concern, not reimplemented here.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Job lifecycle states. Terminal at `Completed`/`Failed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Active,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Persisted state of one job
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub status: JobStatus,
    /// Percent complete, monotonic until a terminal state
    pub progress: u8,
    /// Result payload once completed
    pub result: Option<Value>,
    /// Failure reason once failed
    pub error: Option<String>,
    /// Processing attempts made so far
    pub attempts_made: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: JobStatus::Queued,
            progress: 0,
            result: None,
            error: None,
            attempts_made: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Backing store for job state; the system of record across restarts when
/// implemented durably.
pub trait JobStore: Send + Sync {
    /// Insert a fresh record
    fn insert(&self, record: JobRecord);

    /// Mutate a record in place; returns false for unknown ids
    fn update(&self, id: Uuid, mutate: &mut dyn FnMut(&mut JobRecord)) -> bool;

    /// Fetch a record by id
    fn get(&self, id: Uuid) -> Option<JobRecord>;

    /// All records, newest first
    fn list(&self) -> Vec<JobRecord>;

    /// Prune completed jobs; failed ones are retained for inspection
    fn sweep_completed(&self) -> usize;
}

/// Default in-memory store
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: DashMap<Uuid, JobRecord>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for MemoryJobStore {
    fn insert(&self, record: JobRecord) {
        self.jobs.insert(record.id, record);
    }

    fn update(&self, id: Uuid, mutate: &mut dyn FnMut(&mut JobRecord)) -> bool {
        match self.jobs.get_mut(&id) {
            Some(mut record) => {
                mutate(&mut record);
                record.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    fn get(&self, id: Uuid) -> Option<JobRecord> {
        self.jobs.get(&id).map(|r| r.clone())
    }

    fn list(&self) -> Vec<JobRecord> {
        let mut records: Vec<JobRecord> = self.jobs.iter().map(|e| e.value().clone()).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    fn sweep_completed(&self) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|_, record| record.status != JobStatus::Completed);
        before - self.jobs.len()
    }
}
