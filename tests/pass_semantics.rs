mod common;

use async_trait::async_trait;
use common::*;
use mmg_typereg::graph::{Annotation, Module, Namespace, ProgramGraph, TypeDecl};
use mmg_typereg::pass::{never_cancel, Severity};
use mmg_typereg::prelude::*;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::watch;

// 有效集合之间夹着一个缺少名称的声明和一个无法解析标记的声明
fn mixed_graph() -> ProgramGraph {
    ProgramGraph::new(
        "app",
        vec![Module::new("app").with_namespace(
            Namespace::new("zoo")
                .with_type(TypeDecl::capability("Animal"))
                .with_type(TypeDecl::class("Cat").implements(ty("zoo::Animal")))
                .with_type(TypeDecl::class("Dog").implements(ty("zoo::Animal")))
                .with_type(
                    TypeDecl::class("Pets")
                        .implements(collection_base("zoo::Animal"))
                        .annotated(collection("pets")),
                )
                .with_type(
                    TypeDecl::class("Nameless")
                        .implements(collection_base("zoo::Animal"))
                        .annotated(Annotation::new("collection")),
                )
                .with_type(
                    TypeDecl::class("Farm")
                        .implements(collection_base("zoo::Animal"))
                        .annotated(Annotation::new("transitive_collection").positional("farm")),
                )
                .with_type(
                    TypeDecl::class("Unmarked").annotated(collection("unmarked")),
                ),
        )],
    )
    .unwrap()
}

#[test]
fn missing_name_fails_only_its_own_declaration() {
    init_tracing();
    let report = Generator::new(Arc::new(mixed_graph()), GeneratorConfig::default()).generate();
    let collections: Vec<_> = report.units.iter().map(|u| u.collection.as_str()).collect();
    assert_eq!(collections, ["pets", "farm"]);
    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].declaration, "zoo::Nameless");
    assert!(errors[0].message.contains("has no name"));
    // 标记无法解析的声明默认静默跳过
    assert!(report.diagnostics.iter().all(|d| d.severity == Severity::Error));
}

#[test]
fn unresolved_marker_warning_is_opt_in() {
    init_tracing();
    let cfg = GeneratorConfig::default().warn_on_unresolved(true);
    let report = Generator::new(Arc::new(mixed_graph()), cfg).generate();
    let warnings: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].declaration, "zoo::Unmarked");
    assert_eq!(report.units.len(), 2);
}

#[test]
fn passes_are_deterministic_and_idempotent() {
    init_tracing();
    let generator = Generator::new(Arc::new(plugins_graph()), GeneratorConfig::default());
    let first = generator.generate();
    let second = generator.generate();
    assert_eq!(first.units, second.units);
    // 重新构建同一符号图也得到逐字节相同的输出
    let rebuilt = Generator::new(Arc::new(plugins_graph()), GeneratorConfig::default()).generate();
    assert_eq!(first.units, rebuilt.units);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_pass_matches_sequential_pass() {
    init_tracing();
    let generator = Generator::new(
        Arc::new(mixed_graph()),
        GeneratorConfig::default().with_workers(2),
    );
    let sequential = generator.generate();
    let concurrent = generator.generate_concurrent(never_cancel()).await;
    assert!(!concurrent.cancelled);
    assert_eq!(sequential.units, concurrent.units);
    assert_eq!(sequential.diagnostics, concurrent.diagnostics);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelled_pass_stops_before_remaining_definitions() {
    init_tracing();
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();
    let generator = Generator::new(Arc::new(shapes_graph()), GeneratorConfig::default());
    let report = generator.generate_concurrent(rx).await;
    assert!(report.cancelled);
    assert!(report.units.is_empty());
}

#[tokio::test]
async fn run_into_hands_units_to_the_sink_in_order() {
    init_tracing();
    let sink = MemorySink::new();
    let generator = Generator::new(Arc::new(plugins_graph()), GeneratorConfig::default());
    let report = generator.run_into(&sink, never_cancel()).await.expect("pass");
    assert_eq!(sink.units(), report.units);
    assert_eq!(
        sink.units().iter().map(|u| u.name.as_str()).collect::<Vec<_>>(),
        ["app.AllPlugins.g.rs", "app.LocalPlugins.g.rs"]
    );
}

struct DirSink {
    root: PathBuf,
}

#[async_trait]
impl OutputSink for DirSink {
    async fn accept(&self, unit: GeneratedUnit) -> anyhow::Result<()> {
        std::fs::write(self.root.join(&unit.name), unit.contents)?;
        Ok(())
    }
}

#[tokio::test]
async fn directory_sink_receives_one_file_per_unit() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let sink = DirSink {
        root: dir.path().to_path_buf(),
    };
    let generator = Generator::new(Arc::new(shapes_graph()), GeneratorConfig::default());
    generator.run_into(&sink, never_cancel()).await.unwrap();
    let written = std::fs::read_to_string(dir.path().join("shapes.Shapes.g.rs")).unwrap();
    assert!(written.contains("pub struct ShapesRegistry;"));
}

struct FailingSink;

#[async_trait]
impl OutputSink for FailingSink {
    async fn accept(&self, _unit: GeneratedUnit) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }
}

#[tokio::test]
async fn sink_failure_is_reported_as_error() {
    let generator = Generator::new(Arc::new(shapes_graph()), GeneratorConfig::default());
    let err = generator
        .run_into(&FailingSink, never_cancel())
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Sink(_)));
    assert!(err.to_string().contains("disk full"));
}

#[test]
fn graph_and_config_load_from_json() {
    let graph = ProgramGraph::from_json(
        r#"{
          "current": "app",
          "modules": [{
            "name": "app",
            "namespaces": [{
              "name": "shapes",
              "types": [
                { "name": "IShape", "kind": "capability" },
                { "name": "Circle", "capabilities": ["shapes::IShape"] },
                { "name": "Shapes",
                  "capabilities": ["mmg_typereg::CollectionBase<shapes::IShape>"],
                  "annotations": [{ "name": "collection", "args": [{ "value": { "str": "shapes" } }] }] }
              ]
            }]
          }]
        }"#,
    )
    .expect("graph json");
    let cfg = GeneratorConfig::from_json(r#"{ "workers": 2 }"#).expect("config json");
    assert_eq!(cfg.workers, 2);
    assert_eq!(cfg.collection_annotation, "collection");
    let report = Generator::new(Arc::new(graph), cfg).generate();
    let file = parse_unit(&report.units[0].contents);
    assert_eq!(names(&file, "ShapesRegistry"), ["Circle"]);

    assert!(matches!(
        GeneratorConfig::from_json(r#"{ "workers": 0 }"#),
        Err(RegistryError::Config(_))
    ));
    assert!(matches!(
        ProgramGraph::from_json(r#"{ "current": "missing", "modules": [] }"#),
        Err(RegistryError::Graph(_))
    ));
}
