//! Dependency-closure bundling of named source modules
//!
//! A [`Registry`] of modules is handed to a [`Builder`], reduced to what a
//! set of entry points needs, and concatenated with anonymous AMD
//! `define()` calls named after their module.

pub mod amd;
pub mod builder;
pub mod cache;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod loader;
pub mod module;
pub mod packager;
pub mod registry;

pub use amd::AmdRewriter;
pub use builder::{Builder, Reduction, DEFAULT_GLUE};
pub use cache::{BundleCache, CacheError};
pub use config::{CliOverrides, ConfigError, PackagerConfig};
pub use errors::{BuildError, FetchError, LoadError, PackagerError};
pub use fetch::{ContentFetcher, FileFetcher, MemoryFetcher};
pub use loader::{Loader, LoaderConfig};
pub use module::Module;
pub use packager::Packager;
pub use registry::Registry;
