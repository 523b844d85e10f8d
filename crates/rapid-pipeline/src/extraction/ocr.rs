//! OCR over raster images via tesseract
//!
//! Each recognition call provisions its own scoped workspace and releases it
//! on every exit path, including failure.

use std::path::PathBuf;
use std::process::Command;

use crate::error::{Error, Result};

/// Scoped per-call workspace. Dropping the guard removes the directory, so
/// release is guaranteed no matter how the recognition call exits.
struct OcrWorkspace {
    dir: PathBuf,
}

impl OcrWorkspace {
    fn provision(prefix: &str) -> Result<Self> {
        let dir = std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::internal(format!("Failed to create OCR workspace: {}", e)))?;
        Ok(Self { dir })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl Drop for OcrWorkspace {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            tracing::debug!("Failed to remove OCR workspace {}: {}", self.dir.display(), e);
        }
    }
}

/// Recognition adapter shelling out to tesseract
pub struct OcrAdapter {
    language: String,
}

impl OcrAdapter {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    /// Check if tesseract is available
    pub fn is_available() -> bool {
        Command::new("tesseract")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Recognize text embedded in raster image bytes.
    ///
    /// Empty recognized text is a valid result, not an error. Engine errors
    /// are wrapped into the same classified extraction failure the format
    /// extractors use.
    pub fn recognize(&self, filename: &str, data: &[u8]) -> Result<String> {
        if !Self::is_available() {
            return Err(Error::extraction(
                filename,
                "OCR requires tesseract. Install with: apt install tesseract-ocr",
            ));
        }

        let workspace = OcrWorkspace::provision("rapid-ocr")?;

        let image_path = workspace.path("input.png");
        std::fs::write(&image_path, data)
            .map_err(|e| Error::extraction(filename, format!("Failed to stage image: {}", e)))?;

        let output = Command::new("tesseract")
            .args([
                image_path.to_str().unwrap_or_default(),
                "stdout",
                "-l",
                &self.language,
            ])
            .output()
            .map_err(|e| Error::extraction(filename, format!("tesseract failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::extraction(
                filename,
                format!("tesseract error: {}", stderr.trim()),
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        tracing::info!("[{}] OCR extracted {} characters", filename, text.len());
        Ok(text)
    }
}
