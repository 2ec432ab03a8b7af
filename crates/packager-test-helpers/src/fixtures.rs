//! Test fixtures - registries and module sources for testing

use packager_core::{Builder, Module, Registry};

/// Module with inline content `<id>;` and the given dependencies
pub fn module(id: &str, deps: &[&str]) -> Module {
    Module::new(id)
        .with_content(format!("{id};"))
        .with_dependencies(deps.iter().copied())
}

/// Builder over modules given as `(id, dependencies)` pairs, in order
pub fn builder(graph: &[(&str, &[&str])]) -> Builder {
    Builder::new(registry(graph))
}

pub fn registry(graph: &[(&str, &[&str])]) -> Registry {
    graph.iter().map(|(id, deps)| module(id, deps)).collect()
}

/// `{A: [B], B: [C], C: []}` inserted dependencies-first
pub fn chain() -> Builder {
    builder(&[("C", &[]), ("B", &["C"]), ("A", &["B"])])
}

/// `{A: [B], B: [A]}`
pub fn cycle() -> Builder {
    builder(&[("A", &["B"]), ("B", &["A"])])
}

/// A small MooTools-style layout spread over two packages
pub fn packaged() -> Builder {
    let registry: Registry = [
        module("Core/Core", &[]).with_package("Core"),
        module("Core/Class", &["Core/Core"]).with_package("Core"),
        module("More/Fx", &["Core/Class"]).with_package("More"),
        module("Core/Array", &["Core/Core"]).with_package("Core"),
        module("More/Drag", &["More/Fx", "Core/Array"]).with_package("More"),
    ]
    .into_iter()
    .collect();
    Builder::new(registry)
}

/// Anonymous AMD module depending on `dep`
pub fn amd_source() -> &'static str {
    "define(['dep'], function(dep){ return dep; })"
}

/// Source with several anonymous definitions
pub fn multi_define_source() -> &'static str {
    "define({ name: 'a' });\ndefine(function(){ return 1; });"
}

/// Plain script without a define call
pub fn plain_source() -> &'static str {
    "var plain = true;"
}
