use std::path::PathBuf;
use tracing::{info, warn};

use crate::builder::Builder;
use crate::cache::{cache_key, BundleCache};
use crate::config::PackagerConfig;
use crate::errors::PackagerError;
use crate::loader::Loader;

/// Wires configuration, loader and cache together for one project
pub struct Packager {
    config: PackagerConfig,
    root: PathBuf,
    cache: Option<BundleCache>,
}

impl Packager {
    /// `root` is the directory relative config paths resolve against
    pub fn new(config: PackagerConfig, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let cache = config.cache.then(|| match config.cache_dir {
            Some(ref dir) => BundleCache::with_dir(root.join(dir)),
            None => BundleCache::new(&root),
        });

        Self {
            config,
            root,
            cache,
        }
    }

    pub fn config(&self) -> &PackagerConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&BundleCache> {
        self.cache.as_ref()
    }

    /// Ids to request: the given ones, behind the loader module if enabled
    pub fn requires(&self, ids: &[String]) -> Vec<String> {
        self.config.requires(ids)
    }

    /// Builder holding `requires` and their dependencies
    ///
    /// A fresh cached definition is used when available; otherwise modules
    /// are discovered on disk and the definition is cached. Failing to write
    /// the cache only logs a warning.
    pub fn require(&self, requires: &[String]) -> Result<Builder, PackagerError> {
        let key = cache_key(&self.config, requires)?;

        if let Some(builder) = self.cache.as_ref().and_then(|cache| cache.load(&key)) {
            info!("Using cached bundle definition");
            return Ok(builder);
        }

        let loader = Loader::new(self.config.loader_config(&self.root));
        let builder = loader.require(requires)?;

        if let Some(ref cache) = self.cache {
            if let Err(e) = cache.store(&key, &builder) {
                warn!("Failed to write cache: {}", e);
            }
        }

        Ok(builder)
    }
}
