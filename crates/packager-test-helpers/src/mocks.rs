//! Mock implementations for testing

use packager_core::{ContentFetcher, FetchError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A fetcher serving fixed content and counting requests per url
#[derive(Debug, Default)]
pub struct CountingFetcher {
    files: HashMap<String, String>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl CountingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, url: &str, content: &str) -> Self {
        self.files.insert(url.to_string(), content.to_string());
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Number of fetches of `url` so far
    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

impl ContentFetcher for CountingFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;

        self.files.get(url).cloned().ok_or_else(|| FetchError::NotFound {
            url: url.to_string(),
        })
    }
}

/// A fetcher that fails every request with an IO error
#[derive(Debug, Default)]
pub struct FailingFetcher;

impl ContentFetcher for FailingFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        Err(FetchError::Io {
            url: url.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        })
    }
}
