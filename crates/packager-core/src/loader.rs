//! Discovers modules on disk and fills a registry for the builder
//!
//! Ids are mapped to files through an explicit [`LoaderConfig`]: an id of
//! the form `Alias/rest` lives at `<alias dir>/rest.js`, anything else at
//! `<base url>/<id>.js`. Dependencies are read from the array argument of
//! the file's `define(...)` call.

use indexmap::IndexMap;
use regex::Regex;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::builder::Builder;
use crate::errors::LoadError;
use crate::module::Module;
use crate::registry::Registry;

/// Extension appended to ids that do not carry one
pub const DEFAULT_EXTENSION: &str = "js";

/// `define(` optionally followed by a name string, then a dependency array
static DEFINE_DEPENDENCIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"define\(\s*(?:['"][^'"]*['"]\s*,\s*)?\[([^\]]*)\]"#)
        .expect("dependency pattern is valid")
});

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).expect("string pattern is valid"));

static DEFINE_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"define\(").expect("define pattern is valid"));

/// Where ids are looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    aliases: IndexMap<String, PathBuf>,
    base_url: PathBuf,
    extension: String,
}

impl LoaderConfig {
    pub fn new(base_url: impl Into<PathBuf>) -> Self {
        Self {
            aliases: IndexMap::new(),
            base_url: base_url.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn add_alias(&mut self, alias: impl Into<String>, dir: impl Into<PathBuf>) {
        self.aliases.insert(alias.into(), dir.into());
    }

    pub fn set_base_url(&mut self, base_url: impl Into<PathBuf>) {
        self.base_url = base_url.into();
    }

    pub fn set_extension(&mut self, extension: impl Into<String>) {
        self.extension = extension.into();
    }

    /// File for `id` and the package (alias) it belongs to
    ///
    /// The longest alias that prefixes the id wins.
    pub fn resolve(&self, id: &str) -> (PathBuf, String) {
        let alias = self
            .aliases
            .iter()
            .filter(|(alias, _)| {
                id.strip_prefix(alias.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|(alias, _)| alias.len());

        match alias {
            Some((alias, dir)) => {
                let rest = &id[alias.len() + 1..];
                (dir.join(self.with_extension(rest)), alias.clone())
            }
            None => (self.base_url.join(self.with_extension(id)), String::new()),
        }
    }

    fn with_extension(&self, id: &str) -> String {
        let has_extension = Path::new(id)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension));

        if has_extension || self.extension.is_empty() {
            id.to_string()
        } else {
            format!("{}.{}", id, self.extension)
        }
    }
}

/// Dependencies declared by the first `define([...])` call in `content`,
/// with relative ids resolved against `id`
pub fn scan_dependencies(id: &str, content: &str) -> Vec<String> {
    let Some(caps) = DEFINE_DEPENDENCIES.captures(content) else {
        return Vec::new();
    };

    QUOTED
        .captures_iter(&caps[1])
        .map(|dep| resolve_relative(id, &dep[1]))
        .collect()
}

/// Resolve `./x` and `../x` against the directory of `from`
pub fn resolve_relative(from: &str, dep: &str) -> String {
    if !dep.starts_with("./") && !dep.starts_with("../") {
        return dep.to_string();
    }

    let mut parts: Vec<&str> = from.split('/').collect();
    parts.pop();

    for segment in dep.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }

    parts.join("/")
}

/// Builds a registry by walking `define()` dependencies from requested ids
pub struct Loader {
    config: LoaderConfig,
}

impl Loader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Load `ids` and everything they depend on
    ///
    /// Modules are registered after their dependencies, so the unreduced
    /// registry can be concatenated as is. Content is left to be fetched
    /// from each module's `url` when the bundle is assembled.
    pub fn require<I, S>(&self, ids: I) -> Result<Builder, LoadError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Registry::new();
        let mut visiting = FxHashSet::default();

        for id in ids {
            self.load(id.as_ref(), &mut registry, &mut visiting)?;
        }

        info!("Loaded {} module(s)", registry.len());
        Ok(Builder::new(registry))
    }

    fn load(
        &self,
        id: &str,
        registry: &mut Registry,
        visiting: &mut FxHashSet<String>,
    ) -> Result<(), LoadError> {
        if registry.contains(id) || !visiting.insert(id.to_string()) {
            return Ok(());
        }

        let (path, package) = self.config.resolve(id);
        debug!("Loading {} from {:?}", id, path);

        if !path.is_file() {
            return Err(LoadError::NotFound {
                id: id.to_string(),
                path,
            });
        }

        let content = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
            id: id.to_string(),
            path: path.clone(),
            source,
        })?;

        let dependencies = scan_dependencies(id, &content);
        for dep in &dependencies {
            self.load(dep, registry, visiting)?;
        }

        let module = Module::new(id)
            .with_url(path.to_string_lossy())
            .with_dependencies(dependencies)
            .with_package(package)
            .with_amd(DEFINE_CALL.is_match(&content));

        registry.insert(module);
        Ok(())
    }
}
