//! Job management and progress endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::folder::count_files;
use crate::jobs::{FolderJobPayload, JobRecord, JobStatusReport};
use crate::server::state::AppState;

/// Response from job enqueue
#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub job_id: Uuid,
    pub status: String,
    pub total_files: usize,
    pub message: String,
}

/// POST /api/jobs/folder - Enqueue a folder structure for background
/// processing
pub async fn enqueue_folder_job(
    State(state): State<AppState>,
    Json(payload): Json<FolderJobPayload>,
) -> Result<Json<EnqueueResponse>> {
    let summary = count_files(&payload.folder_structure);
    let record = state.job_queue().enqueue(payload).await?;

    Ok(Json(EnqueueResponse {
        job_id: record.id,
        status: "queued".to_string(),
        total_files: summary.total_files,
        message: format!(
            "Job queued. Use /api/jobs/{} to check progress.",
            record.id
        ),
    }))
}

/// GET /api/jobs/:id - Get job status and progress
///
/// Unknown ids return `{"status": "not-found"}` with 200, never an error.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Json<JobStatusReport> {
    Json(state.job_queue().status(job_id))
}

/// List response
#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobRecord>,
    pub total: usize,
}

/// GET /api/jobs - List all jobs, newest first
pub async fn list_jobs(State(state): State<AppState>) -> Json<JobListResponse> {
    let jobs = state.job_queue().list();
    let total = jobs.len();
    Json(JobListResponse { jobs, total })
}
