//! Generative-AI service boundary: client and batch dispatch

mod batch;
mod client;

pub use batch::{BatchDispatcher, FolderAiOptions, ProcessingMode};
pub use client::{GeminiClient, TextGenerator};
