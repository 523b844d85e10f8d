//! Synchronous processing endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ai::{FolderAiOptions, ProcessingMode};
use crate::error::Result;
use crate::folder::{count_files, FolderAggregator};
use crate::output::{format_output, save_results, FormatOptions};
use crate::types::{
    BatchItem, BatchItemResult, FileRecord, FolderStructure, FolderSummary, OutputFormat,
};

use crate::server::state::AppState;

/// Request for single-file extraction
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub file: FileRecord,
}

/// Response for single-file extraction
#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub file: String,
    pub text: String,
    /// True when the text came from OCR rather than a format extractor
    pub ocr: bool,
}

/// POST /api/extract - Extract text from one file, routing images to OCR
pub async fn extract_file(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>> {
    let file = request.file;

    let (text, ocr) = match state.extractor().extract(&file)? {
        Some(text) => (text, false),
        None => (state.ocr().recognize(&file.name, &file.content)?, true),
    };

    Ok(Json(ExtractResponse {
        file: file.name,
        text,
        ocr,
    }))
}

/// Request for batch processing
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub prompt: String,
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub output_format: OutputFormat,
}

/// Response for batch processing. Failed items are embedded with
/// `success = false`; the request itself succeeds.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<BatchItemResult>,
    pub succeeded: usize,
    pub failed: usize,
}

/// POST /api/process/batch - Extract a file list and send each item to the
/// AI service under bounded concurrency
pub async fn process_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>> {
    let template = match &request.template {
        Some(name) => Some(state.templates().get(name)?),
        None => None,
    };

    let composed = state.compositor().compose(
        &request.prompt,
        template.as_deref(),
        "",
        crate::prompt::PromptContent::SingleFile,
    );

    // Extraction failures become per-item results in their input positions,
    // never request errors
    let mut slots: Vec<Option<BatchItemResult>> =
        request.files.iter().map(|_| None).collect();
    let mut items = Vec::new();
    let mut item_indices = Vec::new();

    for (index, file) in request.files.iter().enumerate() {
        match state.extractor().extract(file) {
            Ok(Some(text)) => {
                items.push(BatchItem::text(&file.name, text));
                item_indices.push(index);
            }
            Ok(None) => {
                let mime = file
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| "image/png".to_string());
                items.push(BatchItem::image(&file.name, file.content.clone(), mime));
                item_indices.push(index);
            }
            Err(e) => {
                slots[index] = Some(BatchItemResult {
                    file: file.name.clone(),
                    path: None,
                    response: format!("Error processing file: {}", e),
                    success: false,
                    output_format: request.output_format,
                });
            }
        }
    }

    let dispatched = state
        .dispatcher()
        .process_batch(
            state.generator(),
            &composed.text,
            &items,
            request.output_format,
        )
        .await;
    for (index, result) in item_indices.into_iter().zip(dispatched) {
        slots[index] = Some(result);
    }

    let results: Vec<BatchItemResult> = slots.into_iter().flatten().collect();

    let succeeded = results.iter().filter(|r| r.success).count();
    let failed = results.len() - succeeded;

    Ok(Json(BatchResponse {
        results,
        succeeded,
        failed,
    }))
}

/// Request for synchronous folder processing
#[derive(Debug, Deserialize)]
pub struct FolderRequest {
    pub prompt: String,
    pub folder_structure: FolderStructure,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub processing_mode: ProcessingMode,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default)]
    pub save_output: bool,
    #[serde(default)]
    pub output_destination: Option<std::path::PathBuf>,
}

/// Response for synchronous folder processing
#[derive(Debug, Serialize)]
pub struct FolderResponse {
    pub summary: FolderSummary,
    pub result: Value,
}

/// POST /api/process/folder - Run a folder structure through extraction and
/// the AI service in one request
pub async fn process_folder(
    State(state): State<AppState>,
    Json(request): Json<FolderRequest>,
) -> Result<Json<FolderResponse>> {
    let template = match &request.template {
        Some(name) => Some(state.templates().get(name)?),
        None => None,
    };

    let summary = count_files(&request.folder_structure);
    tracing::info!(
        "Processing folder structure: {} files across {} folders",
        summary.total_files,
        request.folder_structure.len()
    );

    let aggregator = FolderAggregator::new(state.extractor(), state.ocr());
    let processed = aggregator.process_structure(&request.folder_structure);

    let options = FolderAiOptions {
        mode: request.processing_mode,
        output_format: request.output_format,
        combine: state.config().combine.clone(),
    };

    let outcome = state
        .dispatcher()
        .process_folder(
            state.generator(),
            state.compositor(),
            &request.prompt,
            template.as_deref(),
            &processed,
            &options,
        )
        .await?;

    if request.save_output {
        if let Some(destination) = &request.output_destination {
            let results = outcome.flatten();
            save_results(&results, destination, request.output_format).await?;
        }
    }

    Ok(Json(FolderResponse {
        summary,
        result: serde_json::to_value(&outcome)?,
    }))
}

/// Request for workbook export
#[derive(Debug, Deserialize)]
pub struct WorkbookRequest {
    /// Output filename, `.xlsx` appended when missing
    pub filename: String,
    /// One entry per sheet: name -> rows
    pub sheets: indexmap::IndexMap<String, crate::output::SheetRows>,
    /// Optional template workbook whose header order the sheets follow
    #[serde(default)]
    pub template: Option<FileRecord>,
}

/// Response for workbook export
#[derive(Debug, Serialize)]
pub struct WorkbookResponse {
    pub path: String,
    pub sheets: usize,
}

/// POST /api/export/workbook - Write a workbook with one sheet per data group
pub async fn export_workbook(
    State(state): State<AppState>,
    Json(request): Json<WorkbookRequest>,
) -> Result<Json<WorkbookResponse>> {
    let headers = match &request.template {
        Some(template) => Some(crate::output::read_template_headers(&template.content)?),
        None => None,
    };

    let output_dir = &state.config().output.output_dir;
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| crate::error::Error::persistence(format!("Failed to create output directory: {}", e)))?;

    let mut filename = request.filename;
    if !filename.ends_with(".xlsx") {
        filename.push_str(".xlsx");
    }
    let path = output_dir.join(filename);

    crate::output::write_workbook(&path, &request.sheets, headers.as_ref())?;

    Ok(Json(WorkbookResponse {
        path: path.display().to_string(),
        sheets: request.sheets.values().filter(|rows| !rows.is_empty()).count(),
    }))
}

/// Request for standalone output formatting
#[derive(Debug, Deserialize)]
pub struct FormatRequest {
    pub content: Value,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub title: Option<String>,
}

/// POST /api/format - Render content into the requested output format
pub async fn format_content(Json(request): Json<FormatRequest>) -> Json<Value> {
    let mut options = FormatOptions::default();
    if let Some(title) = request.title {
        options.title = title;
    }
    Json(format_output(&request.content, request.format, &options))
}
