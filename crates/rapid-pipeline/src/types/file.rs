//! File records and extractor-kind classification

use serde::{Deserialize, Serialize};

/// A single ingested file. Immutable once built by the upload layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Filename with extension
    pub name: String,
    /// Raw file bytes
    #[serde(with = "serde_bytes_base64")]
    pub content: Vec<u8>,
    /// MIME type if the upload layer supplied one
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl FileRecord {
    /// Create a record, guessing the MIME type from the filename
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_guess::from_path(&name)
            .first()
            .map(|m| m.essence_str().to_string());
        Self {
            name,
            content,
            mime_type,
        }
    }

    /// File size in bytes
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Lowercased extension, empty when absent
    pub fn extension(&self) -> String {
        self.name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.name)
            .unwrap_or("")
            .to_lowercase()
    }

    /// Classify this record by extension
    pub fn kind(&self) -> FileKind {
        FileKind::classify(&self.extension())
    }
}

/// Extractor kinds, matched totally at every dispatch site. Unknown
/// extensions land in `Unsupported` rather than a catch-all error path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// PDF document
    Pdf,
    /// Excel spreadsheet (.xlsx, .xls)
    Spreadsheet,
    /// Word document (.docx) - raw text only, formatting dropped
    WordDocument,
    /// Plain text file
    PlainText,
    /// Markdown file
    Markdown,
    /// CSV file
    Csv,
    /// Raster image - routed to OCR, never extracted directly
    Image,
    /// Anything else
    Unsupported(String),
}

impl FileKind {
    /// Detect the extractor kind from a lowercased extension
    pub fn classify(ext: &str) -> Self {
        match ext {
            "pdf" => Self::Pdf,
            "xlsx" | "xls" => Self::Spreadsheet,
            "docx" => Self::WordDocument,
            "txt" | "text" => Self::PlainText,
            "md" | "markdown" => Self::Markdown,
            "csv" => Self::Csv,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "tiff" | "tif" => Self::Image,
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// True for raster images (the OCR sentinel)
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image)
    }

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Pdf => "PDF",
            Self::Spreadsheet => "Spreadsheet",
            Self::WordDocument => "Word Document",
            Self::PlainText => "Text File",
            Self::Markdown => "Markdown",
            Self::Csv => "CSV",
            Self::Image => "Image",
            Self::Unsupported(ext) => ext.as_str(),
        }
    }
}

/// Base64 transport encoding for raw file bytes, matching what the upload
/// layer sends over JSON.
mod serde_bytes_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
