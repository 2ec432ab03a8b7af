use packager_core::{AmdRewriter, BuildError, Builder, FetchError, Module, Registry, DEFAULT_GLUE};
use packager_test_helpers::fixtures::{self, builder, chain, cycle, module, packaged};
use packager_test_helpers::mocks::{CountingFetcher, FailingFetcher};
use std::sync::Arc;

// ============================================================================
// REDUCTION TESTS
// ============================================================================

#[test]
fn test_reduce_chain_order() {
    assert_eq!(chain().reduce(["A"]).modules(), vec!["A", "B", "C"]);
}

#[test]
fn test_reduce_cycle_terminates() {
    assert_eq!(cycle().reduce(["A"]).modules(), vec!["A", "B"]);
    assert_eq!(cycle().reduce(["B"]).modules(), vec!["B", "A"]);
}

#[test]
fn test_reduce_missing_dependency_is_silent() {
    let reduced = builder(&[("A", &["X"])]).reduce(["A"]);
    assert_eq!(reduced.modules(), vec!["A"]);
    // The dangling reference stays on the record
    assert_eq!(reduced.dependencies()["A"], ["X".to_string()]);
}

#[test]
fn test_reduce_unknown_root_yields_empty() {
    let reduced = chain().reduce(["nope"]);
    assert!(reduced.loaded().is_empty());
}

#[test]
fn test_reduce_multiple_roots_in_given_order() {
    let b = builder(&[("A", &[]), ("B", &["A"]), ("C", &[]), ("D", &["C"])]);
    assert_eq!(b.reduce(["D", "B"]).modules(), vec!["D", "C", "B", "A"]);
}

#[test]
fn test_reduce_shared_dependency_placed_at_first_visit() {
    let reduced = packaged().reduce(["More/Drag"]);
    assert_eq!(
        reduced.modules(),
        vec!["More/Drag", "More/Fx", "Core/Class", "Core/Core", "Core/Array"]
    );
}

#[test]
fn test_reduce_is_idempotent() {
    let once = packaged().reduce(["More/Drag"]);
    let ids: Vec<String> = once.modules().iter().map(|id| id.to_string()).collect();
    let twice = once.clone().reduce(&ids);

    assert_eq!(twice.modules(), once.modules());
    assert_eq!(twice.loaded(), once.loaded());
}

#[test]
fn test_reduce_never_adds_modules() {
    let b = packaged();
    let all = b.loaded().clone();
    let reduced = b.reduce(["Core/Class", "More/Fx", "Core/Class"]);

    for id in reduced.modules() {
        assert!(all.contains(id));
    }
    assert!(reduced.loaded().len() <= all.len());
}

#[test]
fn test_reduce_with_report_lists_skipped() {
    let b = builder(&[("A", &["X", "B"]), ("B", &["X", "Y"])]);
    let (reduced, reduction) = b.reduce_with_report(["A", "Q"]);

    assert_eq!(reduced.modules(), vec!["A", "B"]);
    assert_eq!(reduction.skipped, vec!["X", "Y", "Q"]);
}

// ============================================================================
// ASSEMBLY TESTS
// ============================================================================

#[test]
fn test_output_custom_glue() {
    let b = Builder::new(
        [
            Module::new("x").with_content("x;"),
            Module::new("y").with_content("y;"),
        ]
        .into_iter()
        .collect(),
    );
    assert_eq!(b.output("|").unwrap(), "x;|y;");
}

#[test]
fn test_output_default_glue_follows_registry_order() {
    assert_eq!(chain().output(DEFAULT_GLUE).unwrap(), "C;\n\nB;\n\nA;");
}

#[test]
fn test_amd_literal_rewrite() {
    let b = Builder::new(
        [Module::new("mymod")
            .with_content(fixtures::amd_source())
            .with_amd(true)]
        .into_iter()
        .collect(),
    );

    let output = b.output(DEFAULT_GLUE).unwrap();
    assert!(output.contains("define('mymod', ['dep'], function(dep){"));
}

#[test]
fn test_amd_rewrites_every_call() {
    let b = Builder::new(
        [Module::new("m")
            .with_content(fixtures::multi_define_source())
            .with_amd(true)]
        .into_iter()
        .collect(),
    );

    let output = b.output(DEFAULT_GLUE).unwrap();
    assert_eq!(output.matches("define('m', ").count(), 2);
}

#[test]
fn test_custom_factory_through_builder() {
    let b = Builder::new(
        [
            Module::new("lib/a")
                .with_content("my.define(['x'], function(x){}); define({});")
                .with_amd(true),
            Module::new("lib/b").with_content("my.define({});"),
        ]
        .into_iter()
        .collect(),
    )
    .with_rewriter(AmdRewriter::new("my.define"));

    assert_eq!(
        b.output("|").unwrap(),
        "my.define('lib/a', ['x'], function(x){}); define({});|my.define({});"
    );
}

#[test]
fn test_non_amd_module_untouched() {
    let b = Builder::new(
        [Module::new("m").with_content(fixtures::amd_source())]
            .into_iter()
            .collect(),
    );
    assert_eq!(b.output(DEFAULT_GLUE).unwrap(), fixtures::amd_source());
}

#[test]
fn test_lazy_content_fetched_once_per_pass() {
    let fetcher = CountingFetcher::new()
        .with_file("a.js", fixtures::plain_source())
        .into_arc();
    let b = Builder::new(
        [
            Module::new("a").with_url("a.js"),
            Module::new("inline").with_content("i;").with_url("unused.js"),
        ]
        .into_iter()
        .collect(),
    )
    .with_fetcher(fetcher.clone());

    b.output(DEFAULT_GLUE).unwrap();
    assert_eq!(fetcher.calls("a.js"), 1);
    assert_eq!(fetcher.calls("unused.js"), 0);

    b.output(DEFAULT_GLUE).unwrap();
    assert_eq!(fetcher.total_calls(), 2);
}

#[test]
fn test_fetch_failure_is_surfaced() {
    let b = Builder::new(
        [Module::new("a").with_url("a.js")].into_iter().collect(),
    )
    .with_fetcher(Arc::new(FailingFetcher));

    let err = b.output(DEFAULT_GLUE).unwrap_err();
    assert!(matches!(
        err,
        BuildError::Fetch {
            source: FetchError::Io { .. },
            ..
        }
    ));
    assert!(err.to_string().contains("'a'"));
}

#[test]
fn test_fetch_failure_in_package_output() {
    let b = Builder::new(
        [
            module("ok", &[]).with_package("p1"),
            Module::new("bad").with_url("bad.js").with_package("p2"),
        ]
        .into_iter()
        .collect(),
    )
    .with_fetcher(Arc::new(FailingFetcher));

    assert!(b.output_by_package(DEFAULT_GLUE).is_err());
}

// ============================================================================
// GROUPING AND INTROSPECTION TESTS
// ============================================================================

#[test]
fn test_package_grouping() {
    let registry: Registry = [
        module("A", &[]).with_package("p1"),
        module("B", &[]).with_package("p2"),
        module("C", &[]).with_package("p1"),
    ]
    .into_iter()
    .collect();
    let packages = Builder::new(registry).packages();

    assert_eq!(packages.len(), 2);
    assert_eq!(packages["p1"].ids().collect::<Vec<_>>(), vec!["A", "C"]);
    assert_eq!(packages["p2"].ids().collect::<Vec<_>>(), vec!["B"]);
}

#[test]
fn test_output_by_package_after_reduce() {
    let outputs = packaged()
        .reduce(["More/Fx"])
        .output_by_package("")
        .unwrap();

    assert_eq!(outputs.keys().collect::<Vec<_>>(), vec!["More", "Core"]);
    assert_eq!(outputs["More"], "More/Fx;");
    assert_eq!(outputs["Core"], "Core/Class;Core/Core;");
}

#[test]
fn test_dependencies_map_in_registry_order() {
    let b = packaged();
    let deps = b.dependencies();

    assert_eq!(
        deps.keys().copied().collect::<Vec<_>>(),
        vec!["Core/Core", "Core/Class", "More/Fx", "Core/Array", "More/Drag"]
    );
    assert_eq!(
        deps["More/Drag"],
        ["More/Fx".to_string(), "Core/Array".to_string()]
    );
}

// ============================================================================
// SERIALIZATION TESTS
// ============================================================================

#[test]
fn test_json_round_trip_preserves_everything() {
    let registry: Registry = [
        Module::new("z").with_content("").with_url("z.js").with_amd(true),
        Module::new("a")
            .with_dependencies(["z", "z", "missing"])
            .with_package("pkg"),
        Module::new("m").with_content("m;"),
    ]
    .into_iter()
    .collect();
    let original = Builder::new(registry);

    let restored = Builder::from_json(&original.to_json().unwrap()).unwrap();
    assert_eq!(restored.loaded(), original.loaded());
    assert_eq!(restored.modules(), vec!["z", "a", "m"]);
    assert_eq!(
        restored.loaded().get("z").unwrap().content.as_deref(),
        Some("")
    );
    assert!(restored.loaded().get("a").unwrap().content.is_none());

    let pretty = Builder::from_json(&original.to_json_pretty().unwrap()).unwrap();
    assert_eq!(pretty.loaded(), original.loaded());
}

#[test]
fn test_json_layout() {
    let json = chain().reduce(["B"]).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let b = &value["B"];
    assert_eq!(b["id"], "B");
    assert_eq!(b["content"], "B;");
    assert!(b["url"].is_null());
    assert_eq!(b["dependencies"], serde_json::json!(["C"]));
    assert_eq!(b["package"], "");
    assert_eq!(b["amd"], false);
}

#[test]
fn test_from_json_malformed() {
    assert!(matches!(
        Builder::from_json("{\"a\": {\"id\": \"a\"}"),
        Err(BuildError::Json(_))
    ));
    assert!(matches!(
        Builder::from_json("[1, 2, 3]"),
        Err(BuildError::Json(_))
    ));
}

#[test]
fn test_reduce_definition_with_mismatched_key_terminates() {
    let json = r#"{
        "a": {"id": "b", "url": null, "content": "b;", "dependencies": ["a"], "package": "", "amd": false},
        "b": {"id": "b", "url": null, "content": "real b;", "dependencies": [], "package": "", "amd": false}
    }"#;

    let (reduced, reduction) = Builder::from_json(json).unwrap().reduce_with_report(["a"]);
    assert_eq!(reduced.modules(), vec!["a"]);
    assert!(reduction.skipped.is_empty());
    assert_eq!(reduced.output(DEFAULT_GLUE).unwrap(), "b;");
    assert_eq!(reduced.dependencies()["a"].to_vec(), vec!["a".to_string()]);
    assert_eq!(reduced.packages()[""].ids().collect::<Vec<_>>(), vec!["a"]);
}
