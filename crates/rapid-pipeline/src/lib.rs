//! rapid-pipeline: document ingestion and AI batch processing
//!
//! Accepts single files, file lists, or nested folder structures of
//! heterogeneous documents, extracts normalized text per file (OCR for
//! images), composes bounded prompts with optional templates, dispatches them
//! to a generative-AI service under bounded concurrency, and renders results
//! into text/JSON/HTML/Markdown - synchronously for small requests, or as
//! retryable background jobs with progress reporting for folder workloads.

pub mod ai;
pub mod config;
pub mod error;
pub mod extraction;
pub mod folder;
pub mod jobs;
pub mod output;
pub mod prompt;
pub mod server;
pub mod template;
pub mod types;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use types::{
    BatchItem, BatchItemResult, ExtractionResult, FileKind, FileRecord, FolderStructure,
    FolderSummary, OutputFormat, ProcessedStructure,
};
