//! Writing rendered results to disk and sweeping stale output

use serde_json::Value;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::error::{Error, Result};
use crate::types::{BatchItemResult, OutputFormat};

use super::format::{format_output, FormatOptions};

/// Write one file per result into `destination`, creating the directory if
/// missing. Files are named by the result's file identifier, falling back to
/// `response_<ordinal>`, with the extension matching the output format.
///
/// Persistence failures are raised to the caller: they are not attributable
/// to a single item.
pub async fn save_results(
    results: &[BatchItemResult],
    destination: &Path,
    format: OutputFormat,
) -> Result<()> {
    tokio::fs::create_dir_all(destination)
        .await
        .map_err(|e| Error::persistence(format!("Failed to create output directory: {}", e)))?;

    for (index, result) in results.iter().enumerate() {
        let stem = if result.file.is_empty() {
            format!("response_{}", index + 1)
        } else {
            sanitize_filename(&result.file)
        };
        let path = destination.join(format!("{}{}", stem, format.extension()));

        let rendered = format_output(
            &Value::String(result.response.clone()),
            format,
            &FormatOptions::default(),
        );
        let content = match &rendered {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other)?,
        };

        tokio::fs::write(&path, content)
            .await
            .map_err(|e| Error::persistence(format!("Failed to write {}: {}", path.display(), e)))?;
    }

    tracing::info!(
        "Saved {} results to {}",
        results.len(),
        destination.display()
    );
    Ok(())
}

/// Remove generated files older than `max_age` from the output directory.
/// Best effort: a missing directory or unreadable entry is not an error.
pub fn cleanup_old_files(dir: &Path, max_age: Duration) -> usize {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };

    let cutoff = SystemTime::now() - max_age;
    let mut removed = 0;

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let modified = entry.metadata().and_then(|m| m.modified());
        if let Ok(modified) = modified {
            if modified < cutoff {
                match std::fs::remove_file(&path) {
                    Ok(()) => {
                        tracing::info!("Cleaned up old file: {}", path.display());
                        removed += 1;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to remove {}: {}", path.display(), e);
                    }
                }
            }
        }
    }

    removed
}

/// Replace path separators and other unsafe characters so identifiers can be
/// used as file names
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(file: &str, response: &str) -> BatchItemResult {
        BatchItemResult {
            file: file.to_string(),
            path: None,
            response: response.to_string(),
            success: true,
            output_format: OutputFormat::Text,
        }
    }

    #[tokio::test]
    async fn writes_one_file_per_result() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("nested").join("out");

        let results = vec![result("a.txt", "first"), result("", "second")];
        save_results(&results, &destination, OutputFormat::Text)
            .await
            .unwrap();

        let first = std::fs::read_to_string(destination.join("a.txt.txt")).unwrap();
        assert_eq!(first, "first");
        // Ordinal fallback for results without an identifier
        let second = std::fs::read_to_string(destination.join("response_2.txt")).unwrap();
        assert_eq!(second, "second");
    }

    #[tokio::test]
    async fn json_format_wraps_prose_responses() {
        let dir = tempfile::tempdir().unwrap();
        save_results(&[result("r", "prose")], dir.path(), OutputFormat::Json)
            .await
            .unwrap();

        let content = std::fs::read_to_string(dir.path().join("r.json")).unwrap();
        let value: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["content"], "prose");
    }

    #[test]
    fn cleanup_ignores_fresh_files_and_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fresh.txt"), "x").unwrap();

        assert_eq!(cleanup_old_files(dir.path(), Duration::from_secs(3600)), 0);
        assert!(dir.path().join("fresh.txt").exists());

        let missing = dir.path().join("not-here");
        assert_eq!(cleanup_old_files(&missing, Duration::from_secs(3600)), 0);
    }

    #[test]
    fn cleanup_removes_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stale.txt"), "x").unwrap();

        // Near-zero max-age makes the file stale once the clock moves past it
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(cleanup_old_files(dir.path(), Duration::from_millis(1)), 1);
        assert!(!dir.path().join("stale.txt").exists());
    }
}
