//! Batch dispatch to the AI service under bounded concurrency

use futures::future::join_all;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::config::{BatchConfig, CombineConfig};
use crate::error::Result;
use crate::folder::combine_extracted_text;
use crate::prompt::{PromptCompositor, PromptContent};
use crate::types::{
    BatchItem, BatchItemResult, BatchPayload, FolderAiOutcome, OutputFormat, ProcessedStructure,
};

use super::client::TextGenerator;

/// Folder-level dispatch mode
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// One AI call over the merged corpus
    #[default]
    Combined,
    /// One call per file, grouped by originating folder
    Individual,
}

/// Options for folder-level dispatch
#[derive(Debug, Clone, Default)]
pub struct FolderAiOptions {
    pub mode: ProcessingMode,
    pub output_format: OutputFormat,
    pub combine: CombineConfig,
}

/// Dispatches prompts to the AI service in fixed-size windows.
///
/// A window fully resolves before the next one starts; completions within a
/// window may arrive out of issue order, but results are collected per-window
/// so output order always matches input order.
pub struct BatchDispatcher {
    config: BatchConfig,
}

impl BatchDispatcher {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Send every item to the AI service, returning one result per item in
    /// the original order.
    ///
    /// An item whose call fails is recorded with `success = false` and the
    /// error embedded in its response; it never cancels or delays siblings in
    /// the same or later windows.
    pub async fn process_batch(
        &self,
        generator: &dyn TextGenerator,
        base_prompt: &str,
        items: &[BatchItem],
        output_format: OutputFormat,
    ) -> Vec<BatchItemResult> {
        let window_size = self.config.max_concurrent.max(1);
        let mut results = Vec::with_capacity(items.len());

        for window in items.chunks(window_size) {
            let calls = window.iter().map(|item| async {
                let outcome = match &item.payload {
                    BatchPayload::Text(text) => {
                        let full_prompt =
                            format!("{} Process this file content: {}", base_prompt, text);
                        generator.generate(&full_prompt).await
                    }
                    BatchPayload::Image { data, mime_type } => {
                        generator.generate_with_image(base_prompt, data, mime_type).await
                    }
                };

                match outcome {
                    Ok(response) => BatchItemResult {
                        file: item.file.clone(),
                        path: item.path.clone(),
                        response,
                        success: true,
                        output_format,
                    },
                    Err(e) => {
                        tracing::error!("[{}] AI call failed: {}", item.file, e);
                        BatchItemResult {
                            file: item.file.clone(),
                            path: item.path.clone(),
                            response: format!("Error processing file: {}", e),
                            success: false,
                            output_format,
                        }
                    }
                }
            });

            results.extend(join_all(calls).await);
        }

        results
    }

    /// Run a processed folder structure through the AI service in the
    /// requested mode.
    pub async fn process_folder(
        &self,
        generator: &dyn TextGenerator,
        compositor: &PromptCompositor,
        prompt: &str,
        template: Option<&str>,
        processed: &ProcessedStructure,
        options: &FolderAiOptions,
    ) -> Result<FolderAiOutcome> {
        match options.mode {
            ProcessingMode::Combined => {
                let corpus = combine_extracted_text(processed, &options.combine);
                let composed =
                    compositor.compose(prompt, template, &corpus, PromptContent::Combined);

                tracing::info!(
                    "Dispatching combined corpus ({} chars) to {}",
                    composed.total_length(),
                    generator.name()
                );

                let response = generator.generate(&composed.text).await?;

                Ok(FolderAiOutcome::Combined {
                    combined: true,
                    response,
                    output_format: options.output_format,
                })
            }
            ProcessingMode::Individual => {
                let composed = compositor.compose(prompt, template, "", PromptContent::SingleFile);
                let mut responses = IndexMap::new();

                for (folder_path, results) in processed {
                    let items: Vec<BatchItem> = results
                        .iter()
                        .filter(|r| r.succeeded)
                        .map(|r| {
                            if let Some(bytes) = &r.image_content {
                                let mime = r
                                    .mime_type
                                    .clone()
                                    .unwrap_or_else(|| "image/png".to_string());
                                BatchItem::image(&r.name, bytes.clone(), mime)
                                    .with_path(folder_path)
                            } else {
                                BatchItem::text(&r.name, &r.text).with_path(folder_path)
                            }
                        })
                        .collect();

                    let folder_results = self
                        .process_batch(generator, &composed.text, &items, options.output_format)
                        .await;
                    responses.insert(folder_path.clone(), folder_results);
                }

                Ok(FolderAiOutcome::Individual {
                    combined: false,
                    responses,
                })
            }
        }
    }
}
