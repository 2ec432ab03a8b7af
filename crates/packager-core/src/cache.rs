//! On-disk cache of reduced bundle definitions
//!
//! A cache entry stores the JSON produced by [`Builder::to_json`] together
//! with a hash of every source file the definition points at, so a later run
//! with the same configuration and request can skip module discovery. The
//! entry is ignored once any of those files changes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::builder::Builder;
use crate::config::PackagerConfig;
use crate::errors::{BuildError, FetchError};
use crate::fetch::{ContentFetcher, FileFetcher};

/// Cache format version - increment when the entry layout changes
pub const CACHE_VERSION: u32 = 1;

/// Default cache directory name
pub const CACHE_DIR_NAME: &str = ".packager-cache";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid cached definition: {0}")]
    Definition(#[from] BuildError),

    #[error("Failed to hash source: {0}")]
    Source(#[from] FetchError),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Blake3 hex digest of arbitrary text
pub fn hash_content(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// Key identifying a request: configuration plus requested ids
pub fn cache_key(config: &PackagerConfig, requires: &[String]) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(serde_json::to_string(config)?.as_bytes());
    for id in requires {
        hasher.update(b"\0");
        hasher.update(id.as_bytes());
    }
    Ok(hasher.finalize().to_hex().to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    version: u32,

    /// url -> hash of its content when the entry was written
    sources: IndexMap<String, String>,

    /// Bundle definition as produced by `Builder::to_json`
    registry: String,
}

/// Stores bundle definitions under `<root>/.packager-cache`
pub struct BundleCache {
    cache_dir: PathBuf,
    fetcher: FileFetcher,
}

impl BundleCache {
    pub fn new(root: &Path) -> Self {
        Self::with_dir(root.join(CACHE_DIR_NAME))
    }

    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            fetcher: FileFetcher::new(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    fn source_hashes(&self, builder: &Builder) -> Result<IndexMap<String, String>> {
        let mut sources = IndexMap::new();
        for module in builder.loaded().values() {
            if let Some(url) = module.pending_url() {
                let content = self.fetcher.fetch(url)?;
                sources.insert(url.to_string(), hash_content(&content));
            }
        }
        Ok(sources)
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        entry.sources.iter().all(|(url, hash)| match self.fetcher.fetch(url) {
            Ok(content) => hash_content(&content) == *hash,
            Err(_) => false,
        })
    }

    /// Cached definition for `key`, or `None` when absent or stale
    ///
    /// Unreadable or corrupted entries are treated as misses.
    pub fn load(&self, key: &str) -> Option<Builder> {
        let path = self.entry_path(key);
        if !path.exists() {
            debug!("No cache entry for {}", key);
            return None;
        }

        let entry: CacheEntry = match std::fs::read_to_string(&path)
            .map_err(CacheError::from)
            .and_then(|json| serde_json::from_str::<CacheEntry>(&json).map_err(CacheError::from))
        {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Corrupted cache entry {:?}: {}", path, e);
                return None;
            }
        };

        if entry.version != CACHE_VERSION {
            warn!(
                "Cache version mismatch: expected {}, found {}",
                CACHE_VERSION, entry.version
            );
            return None;
        }

        if !self.is_fresh(&entry) {
            info!("Cache entry {} is stale", key);
            return None;
        }

        match Builder::from_json(&entry.registry) {
            Ok(builder) => {
                info!("Loaded {} module(s) from cache", builder.loaded().len());
                Some(builder)
            }
            Err(e) => {
                warn!("Corrupted cached definition {:?}: {}", path, e);
                None
            }
        }
    }

    /// Write the definition of `builder` under `key`
    pub fn store(&self, key: &str, builder: &Builder) -> Result<()> {
        std::fs::create_dir_all(&self.cache_dir)?;

        let entry = CacheEntry {
            version: CACHE_VERSION,
            sources: self.source_hashes(builder)?,
            registry: builder.to_json_pretty()?,
        };

        std::fs::write(self.entry_path(key), serde_json::to_string_pretty(&entry)?)?;
        debug!("Stored cache entry {}", key);
        Ok(())
    }

    /// Remove every cached entry
    pub fn clear(&self) -> Result<()> {
        if self.cache_dir.exists() {
            std::fs::remove_dir_all(&self.cache_dir)?;
        }
        info!("Cache cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Module;
    use crate::registry::Registry;
    use tempfile::TempDir;

    fn builder_for(path: &Path) -> Builder {
        let registry: Registry = [
            Module::new("a").with_url(path.to_string_lossy()),
            Module::new("b").with_content("b;"),
        ]
        .into_iter()
        .collect();
        Builder::new(registry)
    }

    #[test]
    fn test_cache_key_depends_on_request() {
        let config = PackagerConfig::default();
        let a = cache_key(&config, &["a".to_string()]).unwrap();
        let b = cache_key(&config, &["b".to_string()]).unwrap();

        assert_ne!(a, b);
        assert_eq!(a, cache_key(&config, &["a".to_string()]).unwrap());
    }

    #[test]
    fn test_store_then_load() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.js");
        std::fs::write(&source, "a;").unwrap();

        let cache = BundleCache::new(dir.path());
        let builder = builder_for(&source);
        cache.store("key", &builder).unwrap();

        let loaded = cache.load("key").unwrap();
        assert_eq!(loaded.loaded(), builder.loaded());
    }

    #[test]
    fn test_changed_source_invalidates() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.js");
        std::fs::write(&source, "a;").unwrap();

        let cache = BundleCache::new(dir.path());
        cache.store("key", &builder_for(&source)).unwrap();

        std::fs::write(&source, "changed;").unwrap();
        assert!(cache.load("key").is_none());
    }

    #[test]
    fn test_corrupted_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = BundleCache::new(dir.path());
        std::fs::create_dir_all(cache.cache_dir()).unwrap();
        std::fs::write(cache.cache_dir().join("key.json"), "{ nope").unwrap();

        assert!(cache.load("key").is_none());
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.js");
        std::fs::write(&source, "a;").unwrap();

        let cache = BundleCache::new(dir.path());
        cache.store("key", &builder_for(&source)).unwrap();
        cache.clear().unwrap();

        assert!(!cache.cache_dir().exists());
        assert!(cache.load("key").is_none());
    }
}
