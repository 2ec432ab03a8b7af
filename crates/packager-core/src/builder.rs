//! Closure reduction, grouping and assembly over a module registry

use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::amd::AmdRewriter;
use crate::errors::BuildError;
use crate::fetch::{ContentFetcher, FileFetcher};
use crate::module::Module;
use crate::registry::Registry;

pub type Result<T> = std::result::Result<T, BuildError>;

/// Glue placed between modules when none is given
pub const DEFAULT_GLUE: &str = "\n\n";

/// Outcome of a reduction besides the reduced builder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reduction {
    /// Ids that were requested or depended upon but are not in the
    /// registry, in first-encounter order
    pub skipped: Vec<String>,
}

/// Owns a registry and derives bundles from it
#[derive(Clone)]
pub struct Builder {
    registry: Registry,
    fetcher: Arc<dyn ContentFetcher>,
    rewriter: AmdRewriter,
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("registry", &self.registry)
            .field("factory", &self.rewriter.factory())
            .finish_non_exhaustive()
    }
}

impl Builder {
    /// Builder over `registry` reading lazy content from the local file system
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            fetcher: Arc::new(FileFetcher::new()),
            rewriter: AmdRewriter::default(),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn ContentFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_rewriter(mut self, rewriter: AmdRewriter) -> Self {
        self.rewriter = rewriter;
        self
    }

    /// Every loaded module keyed by id
    pub fn loaded(&self) -> &Registry {
        &self.registry
    }

    /// Module ids in registry order
    pub fn modules(&self) -> Vec<&str> {
        self.registry.ids().collect()
    }

    /// Declared dependencies of each module, unresolved
    pub fn dependencies(&self) -> IndexMap<&str, &[String]> {
        self.registry
            .iter()
            .map(|(id, module)| (id.as_str(), module.dependencies.as_slice()))
            .collect()
    }

    /// Modules bucketed by their package label
    ///
    /// Buckets appear in the order their first module does; inside a bucket
    /// modules keep their relative registry order.
    pub fn packages(&self) -> IndexMap<String, Registry> {
        let mut packages: IndexMap<String, Registry> = IndexMap::new();
        for (id, module) in &self.registry {
            packages
                .entry(module.package.clone())
                .or_default()
                .insert_as(id.clone(), module.clone());
        }
        packages
    }

    /// Concatenated content of every module, `define()` calls named
    pub fn output(&self, glue: &str) -> Result<String> {
        self.assemble(&self.registry, glue)
    }

    /// [`Builder::output`] applied to each package separately
    pub fn output_by_package(&self, glue: &str) -> Result<IndexMap<String, String>> {
        self.packages()
            .into_iter()
            .map(|(package, modules)| {
                let code = self.assemble(&modules, glue)?;
                Ok((package, code))
            })
            .collect()
    }

    fn assemble(&self, modules: &Registry, glue: &str) -> Result<String> {
        let modules: Vec<&Module> = modules.values().collect();
        let code = modules
            .par_iter()
            .map(|module| self.fix(module))
            .collect::<Result<Vec<_>>>()?;
        Ok(code.join(glue))
    }

    /// Fetch missing content and name anonymous definitions
    fn fix<'a>(&self, module: &'a Module) -> Result<Cow<'a, str>> {
        let content: Cow<'a, str> = match module.pending_url() {
            Some(url) => {
                debug!("Fetching {} from {}", module.id, url);
                let fetched = self.fetcher.fetch(url).map_err(|source| BuildError::Fetch {
                    id: module.id.clone(),
                    url: url.to_string(),
                    source,
                })?;
                Cow::Owned(fetched)
            }
            None => Cow::Borrowed(module.content.as_deref().unwrap_or_default()),
        };

        if !module.amd {
            return Ok(content);
        }

        Ok(match content {
            Cow::Borrowed(text) => self.rewriter.name_definitions(text, &module.id),
            Cow::Owned(text) => Cow::Owned(
                self.rewriter
                    .name_definitions(&text, &module.id)
                    .into_owned(),
            ),
        })
    }

    /// Serialize the registry, unresolved content included
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.registry)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.registry)?)
    }

    /// Restore a builder from [`Builder::to_json`] output
    pub fn from_json(json: &str) -> Result<Self> {
        let registry: Registry = serde_json::from_str(json)?;
        Ok(Self::new(registry))
    }

    /// Keep only the given ids and everything they depend on
    ///
    /// The result is in depth-first preorder: a module is placed as soon
    /// as it is first reached, before its own dependencies. Ids missing from
    /// the registry are skipped without error.
    pub fn reduce<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.reduce_with_report(ids).0
    }

    /// [`Builder::reduce`] that also reports the ids it had to skip
    pub fn reduce_with_report<I, S>(self, ids: I) -> (Self, Reduction)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roots: Vec<String> = ids.into_iter().map(|id| id.as_ref().to_string()).collect();
        let (registry, skipped) = reduce_registry(&self.registry, &roots);

        debug!(
            "Reduced {} modules to {} ({} skipped)",
            self.registry.len(),
            registry.len(),
            skipped.len()
        );

        let builder = Self { registry, ..self };
        let reduction = Reduction {
            skipped: skipped.into_iter().collect(),
        };
        (builder, reduction)
    }
}

/// Depth-first preorder closure of `roots` over `source`
///
/// Each stack frame is a dependency list and the position reached in it,
/// which visits ids in exactly the order a recursive walk would. Modules
/// are kept under the id they were reached by so the presence check
/// matches even when a record's own `id` disagrees with its key.
fn reduce_registry(source: &Registry, roots: &[String]) -> (Registry, IndexSet<String>) {
    let mut result = Registry::new();
    let mut skipped = IndexSet::new();
    let mut stack: Vec<(&[String], usize)> = vec![(roots, 0)];

    while let Some(frame) = stack.last_mut() {
        let (ids, index) = *frame;
        let Some(id) = ids.get(index) else {
            stack.pop();
            continue;
        };
        frame.1 += 1;

        if result.contains(id) {
            continue;
        }

        match source.get(id) {
            Some(module) => {
                result.insert_as(id.clone(), module.clone());
                stack.push((module.dependencies.as_slice(), 0));
            }
            None => {
                skipped.insert(id.clone());
            }
        }
    }

    (result, skipped)
}
