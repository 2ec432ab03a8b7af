use std::path::PathBuf;
use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConfigError;

/// Failure to read a module's content from its `url`
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read '{url}': {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported url scheme '{scheme}' in '{url}'")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("invalid url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("no content registered for '{url}'")]
    NotFound { url: String },
}

/// Errors raised by [`crate::Builder`] operations
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("could not fetch content of module '{id}' from '{url}'")]
    Fetch {
        id: String,
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("invalid bundle definition: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while discovering modules on disk
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("module '{id}' not found at {path}")]
    NotFound { id: String, path: PathBuf },

    #[error("failed to read module '{id}' from {path}: {source}")]
    Io {
        id: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level error for everything the library can fail with
#[derive(Debug, Error)]
pub enum PackagerError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
