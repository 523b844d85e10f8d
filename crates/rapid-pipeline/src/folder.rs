//! Folder aggregation: per-file extraction with failure isolation, text
//! combining, and file counting

use std::collections::HashMap;

use crate::config::CombineConfig;
use crate::extraction::{OcrAdapter, TextExtractor};
use crate::types::{ExtractionResult, FolderStructure, FolderSummary, ProcessedStructure};

/// Marker appended whenever content is cut by a length ceiling
pub const TRUNCATION_MARKER: &str = "\n\n... (content truncated due to length limit)";

/// Truncate `text` to at most `max_chars` characters. Truncated output is
/// exactly `max_chars` long and ends with [`TRUNCATION_MARKER`]; content
/// within the ceiling passes through untouched.
pub fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    let len = text.chars().count();
    if len <= max_chars {
        return text.to_string();
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    let keep = max_chars.saturating_sub(marker_len);
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Walks folder structures, extracting text per file
pub struct FolderAggregator<'a> {
    extractor: &'a TextExtractor,
    ocr: &'a OcrAdapter,
}

impl<'a> FolderAggregator<'a> {
    pub fn new(extractor: &'a TextExtractor, ocr: &'a OcrAdapter) -> Self {
        Self { extractor, ocr }
    }

    /// Produce an [`ExtractionResult`] for every file in the structure,
    /// preserving folder and file iteration order.
    ///
    /// A file that fails to extract is captured inline with
    /// `succeeded = false` and its error message; the walk never aborts on a
    /// single file.
    pub fn process_structure(&self, structure: &FolderStructure) -> ProcessedStructure {
        let mut processed = ProcessedStructure::new();

        for (folder_path, files) in structure {
            let results = files
                .iter()
                .map(|file| match self.extractor.extract(file) {
                    Ok(Some(text)) => ExtractionResult::ok(file, folder_path, text),
                    // Sentinel: the file is an image, route to OCR
                    Ok(None) => match self.ocr.recognize(&file.name, &file.content) {
                        Ok(text) => ExtractionResult::ok_image(file, folder_path, text),
                        Err(e) => {
                            tracing::error!("[{}] OCR failed: {}", file.name, e);
                            ExtractionResult::failed(file, folder_path, e.to_string())
                        }
                    },
                    Err(e) => {
                        tracing::error!("[{}] Extraction failed: {}", file.name, e);
                        ExtractionResult::failed(file, folder_path, e.to_string())
                    }
                })
                .collect();

            processed.insert(folder_path.clone(), results);
        }

        processed
    }
}

/// Concatenate all successfully extracted text with folder/file header
/// separators, enforcing the combined-length ceiling. Folder headers appear
/// only when the structure holds more than one folder.
pub fn combine_extracted_text(processed: &ProcessedStructure, options: &CombineConfig) -> String {
    let mut combined = String::new();
    let multiple_folders = processed.len() > 1;

    for (folder_path, results) in processed {
        if multiple_folders {
            combined.push_str(&format!("\n\n=== Folder: {} ===\n\n", folder_path));
        }

        for result in results {
            if result.succeeded && !result.text.is_empty() {
                if options.include_file_paths {
                    combined.push_str(&format!("\n--- File: {} ---\n\n", result.name));
                }
                combined.push_str(&result.text);
                combined.push_str("\n\n");
            }
        }
    }

    truncate_with_marker(combined.trim(), options.max_chars)
}

/// Count total files and files per extension for instrumentation
pub fn count_files(structure: &FolderStructure) -> FolderSummary {
    let mut total_files = 0;
    let mut file_types: HashMap<String, usize> = HashMap::new();

    for files in structure.values() {
        total_files += files.len();
        for file in files {
            *file_types.entry(file.extension()).or_insert(0) += 1;
        }
    }

    FolderSummary {
        total_files,
        file_types,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::types::FileRecord;

    fn aggregate(structure: &FolderStructure) -> ProcessedStructure {
        let extractor = TextExtractor::new(ExtractionConfig::default());
        let ocr = OcrAdapter::new("eng");
        FolderAggregator::new(&extractor, &ocr).process_structure(structure)
    }

    fn structure_with(files: Vec<(&str, Vec<FileRecord>)>) -> FolderStructure {
        files
            .into_iter()
            .map(|(path, records)| (path.to_string(), records))
            .collect()
    }

    #[test]
    fn failure_is_isolated_per_file() {
        let structure = structure_with(vec![(
            "/",
            vec![
                FileRecord::new("good.txt", b"fine".to_vec()),
                FileRecord::new("bad.pdf", b"not a pdf".to_vec()),
                FileRecord::new("also-good.txt", b"still fine".to_vec()),
            ],
        )]);

        let processed = aggregate(&structure);
        let results = &processed["/"];
        assert_eq!(results.len(), 3);
        assert!(results[0].succeeded);
        assert!(!results[1].succeeded);
        assert!(results[1].text.starts_with("Error:"));
        assert!(results[2].succeeded);
    }

    #[test]
    fn processing_is_idempotent() {
        let structure = structure_with(vec![(
            "/docs",
            vec![FileRecord::new("a.txt", b"Hello world".to_vec())],
        )]);

        let first = aggregate(&structure);
        let second = aggregate(&structure);
        assert_eq!(first["/docs"][0].text, second["/docs"][0].text);
        assert_eq!(first["/docs"][0].text, "Hello world");
    }

    #[test]
    fn folder_order_is_preserved() {
        let structure = structure_with(vec![
            ("/z", vec![FileRecord::new("z.txt", b"z".to_vec())]),
            ("/a", vec![FileRecord::new("a.txt", b"a".to_vec())]),
        ]);

        let processed = aggregate(&structure);
        let keys: Vec<&String> = processed.keys().collect();
        assert_eq!(keys, vec!["/z", "/a"]);
    }

    #[test]
    fn combine_adds_folder_headers_only_for_multiple_folders() {
        let single = aggregate(&structure_with(vec![(
            "/only",
            vec![FileRecord::new("a.txt", b"alpha".to_vec())],
        )]));
        let combined = combine_extracted_text(&single, &CombineConfig::default());
        assert!(!combined.contains("=== Folder:"));
        assert!(combined.contains("--- File: a.txt ---"));
        assert!(combined.contains("alpha"));

        let multi = aggregate(&structure_with(vec![
            ("/one", vec![FileRecord::new("a.txt", b"alpha".to_vec())]),
            ("/two", vec![FileRecord::new("b.txt", b"beta".to_vec())]),
        ]));
        let combined = combine_extracted_text(&multi, &CombineConfig::default());
        assert!(combined.contains("=== Folder: /one ==="));
        assert!(combined.contains("=== Folder: /two ==="));
    }

    #[test]
    fn combine_skips_failed_files() {
        let processed = aggregate(&structure_with(vec![(
            "/",
            vec![
                FileRecord::new("ok.txt", b"keep me".to_vec()),
                FileRecord::new("bad.pdf", b"garbage".to_vec()),
            ],
        )]));
        let combined = combine_extracted_text(&processed, &CombineConfig::default());
        assert!(combined.contains("keep me"));
        assert!(!combined.contains("bad.pdf"));
    }

    #[test]
    fn truncation_hits_ceiling_exactly_with_marker() {
        let long = "x".repeat(500);
        let truncated = truncate_with_marker(&long, 100);
        assert_eq!(truncated.chars().count(), 100);
        assert!(truncated.ends_with(TRUNCATION_MARKER));

        // Content within the ceiling is untouched
        assert_eq!(truncate_with_marker("short", 100), "short");
    }

    #[test]
    fn combine_respects_configured_ceiling() {
        let processed = aggregate(&structure_with(vec![(
            "/",
            vec![FileRecord::new("big.txt", vec![b'y'; 5000])],
        )]));
        let options = CombineConfig {
            max_chars: 1000,
            include_file_paths: true,
        };
        let combined = combine_extracted_text(&processed, &options);
        assert_eq!(combined.chars().count(), 1000);
        assert!(combined.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn count_files_by_extension() {
        let structure = structure_with(vec![
            (
                "/a",
                vec![
                    FileRecord::new("1.txt", vec![]),
                    FileRecord::new("2.txt", vec![]),
                ],
            ),
            ("/b", vec![FileRecord::new("3.pdf", vec![])]),
        ]);

        let summary = count_files(&structure);
        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.file_types["txt"], 2);
        assert_eq!(summary.file_types["pdf"], 1);
    }
}
