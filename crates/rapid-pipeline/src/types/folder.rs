//! Folder structures and per-file extraction results

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::file::{FileKind, FileRecord};

/// Mapping from folder path to its ordered list of files. Built by the
/// upload layer; read-only input to the pipeline. Insertion order is
/// preserved through processing and combining.
pub type FolderStructure = IndexMap<String, Vec<FileRecord>>;

/// Mapping from folder path to per-file extraction results, mirroring the
/// input structure entry for entry.
pub type ProcessedStructure = IndexMap<String, Vec<ExtractionResult>>;

/// Outcome of extracting one file. Always produced, never partial: a failed
/// extraction is recorded inline rather than aborting the folder walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Filename with extension
    pub name: String,
    /// Folder path the file came from
    pub path: String,
    /// Extractor kind the file was dispatched to
    pub kind: FileKind,
    /// Extracted text; empty on failure
    pub text: String,
    /// Whether extraction succeeded
    pub succeeded: bool,
    /// Error message when extraction failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Raw bytes retained for image files so the dispatcher can send them
    /// inline to the AI service
    #[serde(skip)]
    pub image_content: Option<Vec<u8>>,
    /// MIME type for retained image bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl ExtractionResult {
    /// Successful extraction
    pub fn ok(record: &FileRecord, path: &str, text: String) -> Self {
        Self {
            name: record.name.clone(),
            path: path.to_string(),
            kind: record.kind(),
            text,
            succeeded: true,
            error: None,
            image_content: None,
            mime_type: None,
        }
    }

    /// Successful OCR pass over an image; bytes kept for inline AI payloads
    pub fn ok_image(record: &FileRecord, path: &str, text: String) -> Self {
        Self {
            name: record.name.clone(),
            path: path.to_string(),
            kind: FileKind::Image,
            text,
            succeeded: true,
            error: None,
            image_content: Some(record.content.clone()),
            mime_type: record.mime_type.clone(),
        }
    }

    /// Failed extraction, captured inline
    pub fn failed(record: &FileRecord, path: &str, message: String) -> Self {
        Self {
            name: record.name.clone(),
            path: path.to_string(),
            kind: record.kind(),
            text: format!("Error: {}", message),
            succeeded: false,
            error: Some(message),
            image_content: None,
            mime_type: None,
        }
    }

    /// True when this result carries image bytes for the AI service
    pub fn is_image(&self) -> bool {
        self.image_content.is_some()
    }
}

/// File counts for instrumentation
#[derive(Debug, Clone, Serialize)]
pub struct FolderSummary {
    /// Total files across all folders
    pub total_files: usize,
    /// Count of files per extension
    pub file_types: HashMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_embeds_message_in_text() {
        let record = FileRecord::new("broken.pdf", vec![0u8; 4]);
        let result = ExtractionResult::failed(&record, "/", "parse failed".to_string());
        assert!(!result.succeeded);
        assert_eq!(result.text, "Error: parse failed");
        assert_eq!(result.error.as_deref(), Some("parse failed"));
    }
}
