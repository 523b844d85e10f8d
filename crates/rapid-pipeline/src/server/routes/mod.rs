//! API routes for the pipeline server

pub mod jobs;
pub mod process;
pub mod templates;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Synchronous processing
        .route(
            "/extract",
            post(process::extract_file).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/process/batch",
            post(process::process_batch).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/process/folder",
            post(process::process_folder).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/format", post(process::format_content))
        .route(
            "/export/workbook",
            post(process::export_workbook).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Background jobs
        .route(
            "/jobs/folder",
            post(jobs::enqueue_folder_job).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/:id", get(jobs::get_job_status))
        // Templates
        .route("/templates", get(templates::list_templates))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "rapid-pipeline",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Document ingestion and AI batch-processing pipeline",
        "endpoints": {
            "POST /api/extract": "Extract text from a single file (OCR for images)",
            "POST /api/process/batch": "Extract and process a list of files with the AI service",
            "POST /api/process/folder": "Process a folder structure synchronously",
            "POST /api/format": "Render content into text/json/html/markdown",
            "POST /api/export/workbook": "Write a workbook with one sheet per data group",
            "POST /api/jobs/folder": "Enqueue a folder structure as a background job",
            "GET /api/jobs": "List all jobs",
            "GET /api/jobs/:id": "Get job status and progress",
            "GET /api/templates": "List available templates"
        }
    }))
}
