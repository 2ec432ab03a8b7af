use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::builder::DEFAULT_GLUE;
use crate::loader::LoaderConfig;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "packager.yaml";

/// Id of the loader module prepended when `loader` is enabled
pub const LOADER_MODULE: &str = "loader.js";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Project configuration, read from `packager.yaml` or a JSON file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagerConfig {
    /// Module id prefix -> directory holding those modules
    #[serde(default)]
    pub paths: IndexMap<String, String>,

    /// Directory for ids that match no alias
    #[serde(default)]
    pub base_url: Option<String>,

    /// Prepend the loader module to every request (default: false)
    #[serde(default)]
    pub loader: bool,

    /// Text placed between concatenated modules
    #[serde(default = "default_glue")]
    pub glue: String,

    /// Cache reduced bundle definitions between runs (default: true)
    #[serde(default = "default_true")]
    pub cache: bool,

    /// Directory the cache lives in, relative to the config file
    #[serde(default)]
    pub cache_dir: Option<String>,
}

fn default_glue() -> String {
    DEFAULT_GLUE.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PackagerConfig {
    fn default() -> Self {
        Self {
            paths: IndexMap::new(),
            base_url: None,
            loader: false,
            glue: default_glue(),
            cache: true,
            cache_dir: None,
        }
    }
}

/// Command line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub glue: Option<String>,
    pub cache: Option<bool>,
}

impl PackagerConfig {
    /// Load a config file; `.json` files are parsed as JSON, anything else
    /// as YAML
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(serde_yaml::from_str(&content)?)
        }
    }

    /// Write a default configuration to `path`
    pub fn init_file(path: &Path) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(&PackagerConfig::default())?;
        std::fs::write(path, yaml).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn merge(&mut self, overrides: &CliOverrides) {
        if let Some(ref base_url) = overrides.base_url {
            self.base_url = Some(base_url.clone());
        }
        if let Some(ref glue) = overrides.glue {
            self.glue = glue.clone();
        }
        if let Some(cache) = overrides.cache {
            self.cache = cache;
        }
    }

    /// Requested ids with the loader module prepended when enabled
    pub fn requires(&self, ids: &[String]) -> Vec<String> {
        let mut requires = Vec::with_capacity(ids.len() + 1);
        if self.loader {
            requires.push(LOADER_MODULE.to_string());
        }
        requires.extend(ids.iter().cloned());
        requires
    }

    /// Loader settings with relative directories resolved against `root`
    pub fn loader_config(&self, root: &Path) -> LoaderConfig {
        let mut config = LoaderConfig::new(root);
        for (alias, dir) in &self.paths {
            config.add_alias(alias.clone(), root.join(dir));
        }
        if let Some(ref base_url) = self.base_url {
            config.set_base_url(root.join(base_url));
        }
        config
    }
}
