//! Configuration for the processing pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Extraction validation limits
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Combined-corpus limits
    #[serde(default)]
    pub combine: CombineConfig,
    /// Composed-prompt limits
    #[serde(default)]
    pub prompt: PromptConfig,
    /// Template store configuration
    #[serde(default)]
    pub template: TemplateConfig,
    /// Generative-AI service configuration
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Batch dispatch configuration
    #[serde(default)]
    pub batch: BatchConfig,
    /// Output persistence configuration
    #[serde(default)]
    pub output: OutputConfig,
    /// Background job queue configuration
    #[serde(default)]
    pub queue: QueueConfig,
}

impl PipelineConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing sections
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Extraction validation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Maximum size for a single file in bytes (default: 10MB)
    pub max_file_size: u64,
    /// Extensions accepted for non-image extraction
    pub allowed_extensions: Vec<String>,
    /// OCR language passed to the recognition engine
    pub ocr_language: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10MB
            allowed_extensions: ["pdf", "docx", "xlsx", "xls", "csv", "txt", "md"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ocr_language: "eng".to_string(),
        }
    }
}

/// Combined-corpus limits
///
/// Kept separate from [`PromptConfig`]: folder mode and template mode can
/// stack content, so the two ceilings apply independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineConfig {
    /// Maximum combined corpus length in characters
    pub max_chars: usize,
    /// Prefix each file's text with a `--- File: ... ---` header
    pub include_file_paths: bool,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            max_chars: 30_000,
            include_file_paths: true,
        }
    }
}

/// Composed-prompt limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Maximum composed prompt length in characters
    pub max_chars: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self { max_chars: 30_000 }
    }
}

/// Template store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Directory containing template files
    pub templates_dir: PathBuf,
    /// Cache TTL in seconds (default: 1 hour)
    pub cache_ttl_secs: u64,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
            cache_ttl_secs: 3600,
        }
    }
}

/// Generative-AI service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API base URL
    pub base_url: String,
    /// API key (falls back to the GEMINI_API_KEY environment variable)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Generation temperature
    pub temperature: f32,
    /// Maximum output tokens
    pub max_output_tokens: u32,
    /// Per-request timeout in seconds. Unset means no timeout: a hung call
    /// stalls its concurrency-window slot until the connection drops.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            model: "gemini-1.5-flash-latest".to_string(),
            temperature: 0.3,
            max_output_tokens: 2048,
            request_timeout_secs: None,
        }
    }
}

impl GeminiConfig {
    /// Resolve the API key from config or environment
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        std::env::var("GEMINI_API_KEY")
            .map_err(|_| Error::Config("GEMINI_API_KEY is not set".to_string()))
    }
}

/// Batch dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of in-flight AI calls per window
    pub max_concurrent: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_concurrent: 3 }
    }
}

/// Output persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for generated result files and workbooks
    pub output_dir: PathBuf,
    /// Age in hours after which generated files are swept (default: 24h)
    pub cleanup_max_age_hours: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            cleanup_max_age_hours: 24,
        }
    }
}

/// Background job queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Retry attempts for transient job failures
    pub max_attempts: u32,
    /// Base delay for exponential backoff in milliseconds
    pub backoff_base_ms: u64,
    /// Channel capacity for queued jobs
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 1000,
            capacity: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_limits() {
        let config = PipelineConfig::default();
        assert_eq!(config.extraction.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.combine.max_chars, 30_000);
        assert_eq!(config.prompt.max_chars, 30_000);
        assert_eq!(config.batch.max_concurrent, 3);
        assert_eq!(config.queue.max_attempts, 3);
        assert!(config.gemini.request_timeout_secs.is_none());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [batch]
            max_concurrent = 5

            [combine]
            max_chars = 10000
            include_file_paths = false
            "#,
        )
        .unwrap();
        assert_eq!(config.batch.max_concurrent, 5);
        assert_eq!(config.combine.max_chars, 10_000);
        // Untouched sections keep their defaults
        assert_eq!(config.prompt.max_chars, 30_000);
        assert_eq!(config.server.port, 8080);
    }
}
