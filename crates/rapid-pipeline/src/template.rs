//! Template loading with a TTL-bounded cache

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::TemplateConfig;
use crate::error::{Error, Result};

/// Cached template content
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    cached_at: DateTime<Utc>,
}

/// Template store backed by a directory, with a TTL cache in front.
///
/// The cache is the only mutable shared store in the pipeline core; each
/// operation takes the lock once and completes within one turn.
pub struct TemplateStore {
    templates_dir: PathBuf,
    cache: RwLock<HashMap<String, CacheEntry>>,
    ttl_seconds: u64,
}

impl TemplateStore {
    pub fn new(config: &TemplateConfig) -> Self {
        Self {
            templates_dir: config.templates_dir.clone(),
            cache: RwLock::new(HashMap::new()),
            ttl_seconds: config.cache_ttl_secs,
        }
    }

    /// Get a template by name, reading from disk on a cache miss or after
    /// TTL expiry
    pub fn get(&self, name: &str) -> Result<String> {
        {
            let mut cache = self.cache.write();
            if let Some(entry) = cache.get(name) {
                let age = Utc::now().signed_duration_since(entry.cached_at);
                if (age.num_seconds() as u64) < self.ttl_seconds {
                    tracing::debug!("Template cache hit: {}", name);
                    return Ok(entry.value.clone());
                }
                tracing::debug!("Template cache expired: {}", name);
                cache.remove(name);
            }
        }

        let content = self.read_from_disk(name)?;

        self.cache.write().insert(
            name.to_string(),
            CacheEntry {
                value: content.clone(),
                cached_at: Utc::now(),
            },
        );

        Ok(content)
    }

    fn read_from_disk(&self, name: &str) -> Result<String> {
        let path = self.templates_dir.join(name);
        std::fs::read_to_string(&path)
            .map_err(|e| Error::template(format!("Failed to read template '{}': {}", name, e)))
    }

    /// Drop a single cached template
    pub fn invalidate(&self, name: &str) -> bool {
        self.cache.write().remove(name).is_some()
    }

    /// Drop all cached templates
    pub fn clear(&self) {
        self.cache.write().clear();
    }

    /// List template files in the configured directory
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.templates_dir).map_err(|e| {
            Error::template(format!(
                "Failed to list templates in {}: {}",
                self.templates_dir.display(),
                e
            ))
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Cache statistics
    pub fn stats(&self) -> TemplateCacheStats {
        TemplateCacheStats {
            entries: self.cache.read().len(),
            ttl_seconds: self.ttl_seconds,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct TemplateCacheStats {
    pub entries: usize,
    pub ttl_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &std::path::Path, ttl: u64) -> TemplateStore {
        TemplateStore::new(&TemplateConfig {
            templates_dir: dir.to_path_buf(),
            cache_ttl_secs: ttl,
        })
    }

    #[test]
    fn missing_template_is_a_template_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), 3600);
        let err = store.get("nope.md").unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn reads_are_cached_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.md"), "v1").unwrap();
        let store = store_in(dir.path(), 3600);

        assert_eq!(store.get("report.md").unwrap(), "v1");

        // Disk changes are invisible while the entry is cached
        std::fs::write(dir.path().join("report.md"), "v2").unwrap();
        assert_eq!(store.get("report.md").unwrap(), "v1");

        assert!(store.invalidate("report.md"));
        assert_eq!(store.get("report.md").unwrap(), "v2");
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.md"), "v1").unwrap();
        let store = store_in(dir.path(), 0);

        assert_eq!(store.get("report.md").unwrap(), "v1");
        std::fs::write(dir.path().join("report.md"), "v2").unwrap();
        assert_eq!(store.get("report.md").unwrap(), "v2");
    }

    #[test]
    fn list_returns_sorted_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "").unwrap();
        std::fs::write(dir.path().join("a.md"), "").unwrap();
        let store = store_in(dir.path(), 3600);
        assert_eq!(store.list().unwrap(), vec!["a.md", "b.md"]);
    }
}
