use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use url::Url;

use crate::errors::FetchError;

/// Source of module content for records that only carry a `url`
///
/// Implementations must be shareable across threads because assembly may
/// fetch several modules in parallel.
pub trait ContentFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Reads local paths and `file://` urls
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl FileFetcher {
    pub fn new() -> Self {
        Self
    }

    fn to_path(url: &str) -> Result<PathBuf, FetchError> {
        // Bare paths, including Windows drive paths, never parse as a
        // scheme we care about.
        let parsed = match Url::parse(url) {
            Ok(parsed) if parsed.scheme().len() > 1 => parsed,
            _ => return Ok(PathBuf::from(url)),
        };

        if parsed.scheme() != "file" {
            return Err(FetchError::UnsupportedScheme {
                url: url.to_string(),
                scheme: parsed.scheme().to_string(),
            });
        }

        parsed.to_file_path().map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
            message: "not a local file path".to_string(),
        })
    }
}

impl ContentFetcher for FileFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let path = Self::to_path(url)?;
        std::fs::read_to_string(&path).map_err(|source| FetchError::Io {
            url: url.to_string(),
            source,
        })
    }
}

/// In-memory content keyed by url
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    files: RwLock<FxHashMap<String, String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, url: impl Into<String>, content: impl Into<String>) {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), content.into());
    }
}

impl ContentFetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                url: url.to_string(),
            })
    }
}
