//! Schema scripts run through the loader against the in-memory graph

use super::test_utils::{options, write_script, RecordingFactory};
use graph_schema_loader::client::schema::{Frequency, IdStrategy, IndexType};
use graph_schema_loader::client::SchemaKind;
use graph_schema_loader::shutdown::ShutdownHooks;
use graph_schema_loader::SchemaLoader;
use std::sync::Arc;
use tempfile::TempDir;

const SOCIAL_SCHEMA: &str = r#"
/*
 * Social network schema
 */
schema.propertyKey("name").asText().ifNotExist().create();
schema.propertyKey("age").asInt().ifNotExist().create();
schema.propertyKey("city").asText().ifNotExist().create();
schema.propertyKey("lang").asText().ifNotExist().create();
schema.propertyKey("date").asDate().ifNotExist().create();
schema.propertyKey("weight").asDouble().ifNotExist().create();

schema.vertexLabel("person")
      .properties("name", "age", "city")
      .primaryKeys("name")
      .nullableKeys("age", "city")
      .ifNotExist()
      .create();
schema.vertexLabel("software").properties("name", "lang").useCustomizeStringId().ifNotExist().create();

// edges
schema.edgeLabel("knows").sourceLabel("person").targetLabel("person")
      .properties("date", "weight").multiTimes().sortKeys("date").ifNotExist().create();
schema.edgeLabel("created").link("person", "software").properties("date").ifNotExist().create();

schema.indexLabel("personByCity").onV("person").by("city").secondary().ifNotExist().create();
schema.indexLabel("personByAge").onV("person").by("age").range().ifNotExist().create();
schema.indexLabel("knowsByWeight").onE("knows").by("weight").range().ifNotExist().create();
"#;

fn loader(script: &str, dir: &TempDir, factory: &Arc<RecordingFactory>) -> SchemaLoader {
    let path = write_script(dir, script);
    SchemaLoader::with_factory(options(Some(path)), factory.clone())
        .with_shutdown_hooks(ShutdownHooks::new())
}

#[test]
fn test_full_schema_script() {
    let dir = TempDir::new().unwrap();
    let factory = RecordingFactory::new();
    let summary = loader(SOCIAL_SCHEMA, &dir, &factory).execute().unwrap();

    assert!(summary.success);
    assert_eq!(summary.counts.property_keys, 6);
    assert_eq!(summary.counts.vertex_labels, 2);
    assert_eq!(summary.counts.edge_labels, 2);
    assert_eq!(summary.counts.index_labels, 3);

    let schema = &summary.schema;
    assert_eq!(schema.vertex_labels["person"].id_strategy, IdStrategy::PrimaryKey);
    assert_eq!(
        schema.vertex_labels["software"].id_strategy,
        IdStrategy::CustomizeString
    );
    assert_eq!(schema.edge_labels["knows"].frequency, Frequency::Multiple);
    assert_eq!(schema.edge_labels["created"].target_label, "software");
    assert_eq!(schema.index_labels["knowsByWeight"].index_type, IndexType::Range);
}

#[test]
fn test_rerun_with_if_not_exist_skips_everything() {
    let dir = TempDir::new().unwrap();
    let factory = RecordingFactory::new();
    let loader = loader(SOCIAL_SCHEMA, &dir, &factory);

    assert!(loader.run().unwrap());
    let summary = loader.execute().unwrap();
    assert!(summary.success);
    let report = summary.script.unwrap();
    assert!(report.created.is_empty());
    assert_eq!(report.skipped.len(), 13);
}

#[test]
fn test_partial_schema_is_not_rolled_back() {
    let dir = TempDir::new().unwrap();
    let factory = RecordingFactory::new();
    let script = r#"
schema.propertyKey("name").asText().create();
schema.vertexLabel("person").properties("name").primaryKeys("name").create();
schema.edgeLabel("knows").link("person", "robot").create();
schema.propertyKey("age").asInt().create();
"#;
    let summary = loader(script, &dir, &factory).execute().unwrap();

    assert!(!summary.success);
    assert!(summary.error.unwrap().contains("Undefined vertex label: 'robot'"));
    let graph = factory.snapshot("g1");
    assert!(graph.contains(SchemaKind::PropertyKey, "name"));
    assert!(graph.contains(SchemaKind::VertexLabel, "person"));
    assert!(!graph.contains(SchemaKind::PropertyKey, "age"));
}

#[test]
fn test_syntax_error_creates_nothing() {
    let dir = TempDir::new().unwrap();
    let factory = RecordingFactory::new();
    let script = "schema.propertyKey(\"name\").create();\nschema.propertyKey(\"age).create();";
    let summary = loader(script, &dir, &factory).execute().unwrap();

    assert!(!summary.success);
    assert!(summary.error.unwrap().contains("line 2"));
    assert!(factory.snapshot("g1").is_empty());
}
