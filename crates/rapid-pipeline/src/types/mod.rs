//! Core types for the processing pipeline

pub mod batch;
pub mod file;
pub mod folder;

pub use batch::{BatchItem, BatchItemResult, BatchPayload, FolderAiOutcome, OutputFormat};
pub use file::{FileKind, FileRecord};
pub use folder::{ExtractionResult, FolderStructure, FolderSummary, ProcessedStructure};
