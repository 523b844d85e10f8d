//! Batch dispatch items, results, and output formats

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Target encoding for rendered AI output
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Html,
    Markdown,
}

impl OutputFormat {
    /// File extension for persisted results, dot included
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => ".txt",
            Self::Json => ".json",
            Self::Html => ".html",
            Self::Markdown => ".md",
        }
    }

    /// Parse a format name, defaulting to text for unknown values
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "json" => Self::Json,
            "html" => Self::Html,
            "markdown" | "md" => Self::Markdown,
            _ => Self::Text,
        }
    }
}

/// Payload carried by a single batch item
#[derive(Debug, Clone)]
pub enum BatchPayload {
    /// Extracted text content
    Text(String),
    /// Raw image bytes sent inline to the AI service
    Image { data: Vec<u8>, mime_type: String },
}

/// One unit of work for the batch dispatcher
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Filename the item originates from
    pub file: String,
    /// Folder path the item originates from
    pub path: Option<String>,
    /// Item payload
    pub payload: BatchPayload,
}

impl BatchItem {
    /// Text item
    pub fn text(file: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            path: None,
            payload: BatchPayload::Text(content.into()),
        }
    }

    /// Image item with inline bytes
    pub fn image(file: impl Into<String>, data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            path: None,
            payload: BatchPayload::Image {
                data,
                mime_type: mime_type.into(),
            },
        }
    }

    /// Attach the originating folder path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Per-item outcome of a batch dispatch. One per input item, input order
/// preserved; a failed item never affects its siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItemResult {
    /// Filename the item originated from
    pub file: String,
    /// Folder path the item originated from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// AI response text, or an embedded error message on failure
    pub response: String,
    /// Whether the AI call succeeded
    pub success: bool,
    /// Output format the response should be rendered as
    pub output_format: OutputFormat,
}

/// Result of running a folder through the AI service
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum FolderAiOutcome {
    /// One call over the merged corpus
    Combined {
        combined: bool,
        response: String,
        output_format: OutputFormat,
    },
    /// One call per file, grouped by originating folder
    Individual {
        combined: bool,
        responses: IndexMap<String, Vec<BatchItemResult>>,
    },
}

impl FolderAiOutcome {
    /// Flatten to a result list for persistence, regardless of mode
    pub fn flatten(&self) -> Vec<BatchItemResult> {
        match self {
            Self::Combined {
                response,
                output_format,
                ..
            } => vec![BatchItemResult {
                file: "combined".to_string(),
                path: None,
                response: response.clone(),
                success: true,
                output_format: *output_format,
            }],
            Self::Individual { responses, .. } => {
                responses.values().flatten().cloned().collect()
            }
        }
    }
}
