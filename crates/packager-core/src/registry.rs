use indexmap::map::{Iter, Values};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::module::Module;

/// Ordered mapping from module id to module
///
/// Insertion order is the order modules are concatenated in. The registry
/// does not check that dependencies come before their dependents; whoever
/// fills it is responsible for that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    modules: IndexMap<String, Module>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a module under its own id, keeping the position of an
    /// existing entry with the same id
    pub fn insert(&mut self, module: Module) -> Option<Module> {
        self.modules.insert(module.id.clone(), module)
    }

    /// Insert a module under `key`, which may differ from `module.id` when
    /// the registry was restored from a hand-written definition
    pub fn insert_as(&mut self, key: impl Into<String>, module: Module) -> Option<Module> {
        self.modules.insert(key.into(), module)
    }

    pub fn get(&self, id: &str) -> Option<&Module> {
        self.modules.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Module ids in registry order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn iter(&self) -> Iter<'_, String, Module> {
        self.modules.iter()
    }

    pub fn values(&self) -> Values<'_, String, Module> {
        self.modules.values()
    }
}

impl FromIterator<Module> for Registry {
    fn from_iter<T: IntoIterator<Item = Module>>(iter: T) -> Self {
        let mut registry = Registry::new();
        for module in iter {
            registry.insert(module);
        }
        registry
    }
}

impl Extend<Module> for Registry {
    fn extend<T: IntoIterator<Item = Module>>(&mut self, iter: T) {
        for module in iter {
            self.insert(module);
        }
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = (&'a String, &'a Module);
    type IntoIter = Iter<'a, String, Module>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.iter()
    }
}
