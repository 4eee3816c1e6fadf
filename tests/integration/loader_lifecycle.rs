//! Coordinator lifecycle: clear, schema creation, cache refresh and teardown

use super::test_utils::{options, write_script, Event, RecordingFactory};
use graph_schema_loader::client::SchemaKind;
use graph_schema_loader::context::{LoadMode, LoadStage};
use graph_schema_loader::error::LoadError;
use graph_schema_loader::shutdown::ShutdownHooks;
use graph_schema_loader::SchemaLoader;
use std::sync::Arc;
use tempfile::TempDir;

fn loader(options: graph_schema_loader::LoadOptions, factory: &Arc<RecordingFactory>) -> SchemaLoader {
    SchemaLoader::with_factory(options, factory.clone()).with_shutdown_hooks(ShutdownHooks::new())
}

#[test]
fn test_run_without_clear_creates_one_vertex_label() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "schema.vertexLabel(\"person\").create();\n");
    let factory = RecordingFactory::new();
    let loader = loader(options(Some(script)), &factory);

    let context = loader.context().unwrap();
    assert!(!context.closed());
    let summary = loader.run_with(&context).unwrap();

    assert!(summary.success);
    assert!(context.no_error());
    assert!(context.closed());

    let cache = context.schema_cache();
    assert_eq!(cache.count(SchemaKind::VertexLabel), 1);
    assert!(cache.contains(SchemaKind::VertexLabel, "person"));

    assert_eq!(factory.clears(), 0, "clear must not run when disabled");
    assert_eq!(
        factory.events(),
        vec![
            Event::ClientCreated { timeout: 60 },
            Event::Released { timeout: 60 },
        ]
    );
}

#[test]
fn test_run_reports_success_flag() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "schema.propertyKey(\"name\").asText().create()");
    let factory = RecordingFactory::new();
    assert!(loader(options(Some(script)), &factory).run().unwrap());
}

#[test]
fn test_clear_uses_clear_timeout_then_restores() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "schema.vertexLabel(\"person\").create()");
    let factory = RecordingFactory::new();
    let mut opts = options(Some(script));
    opts.clear_all_data = true;
    let loader = loader(opts, &factory);

    let context = loader.context().unwrap();
    let summary = loader.run_with(&context).unwrap();
    assert!(summary.success);
    assert!(summary.cleared);
    assert_eq!(context.timeout(), 60);

    assert_eq!(
        factory.events(),
        vec![
            Event::ClientCreated { timeout: 240 },
            Event::Clear {
                graph: "g1".to_string(),
                timeout: 240
            },
            Event::Released { timeout: 240 },
            Event::ClientCreated { timeout: 60 },
            Event::Released { timeout: 60 },
        ]
    );

    // A later close must not release anything again.
    assert!(!context.close("hook"));
    assert_eq!(factory.releases(), 2);
}

#[test]
fn test_timeout_restored_when_clear_fails() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "schema.vertexLabel(\"person\").create()");
    let factory = RecordingFactory::failing_clear();
    let mut opts = options(Some(script));
    opts.clear_all_data = true;
    let loader = loader(opts, &factory);

    let context = loader.context().unwrap();
    let summary = loader.run_with(&context).unwrap();

    assert!(!summary.success);
    assert!(!context.no_error());
    assert_eq!(context.timeout(), 60);
    assert!(context.closed());
    assert!(summary.error.unwrap().contains("backend unavailable"));

    // The clear client is released; schema creation never started.
    assert_eq!(factory.clients_created(), 1);
    assert_eq!(factory.releases(), 1);
    assert!(factory.snapshot("g1").is_empty());
}

#[test]
fn test_script_fault_in_test_mode_is_raised() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "schema.propertyKey(\"name\").asText()\n  .noSuchMethod()\n  .create()");
    let factory = RecordingFactory::new();
    let mut opts = options(Some(script));
    opts.test_mode = true;
    let loader = loader(opts, &factory);

    let context = loader.context().unwrap();
    let err = loader.run_with(&context).unwrap_err();

    assert!(matches!(err, LoadError::Failed { .. }));
    assert!(matches!(
        err.root_cause(),
        LoadError::ScriptExecution { line: 2, .. }
    ));
    // Teardown completed before the error was raised.
    assert!(context.closed());
    assert_eq!(context.stage(), LoadStage::Closed);
    assert_eq!(factory.releases(), 1);
}

#[test]
fn test_script_fault_outside_test_mode_returns_false() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "schema.propertyKey(\"name\").asText()\n  .noSuchMethod()\n  .create()");
    let factory = RecordingFactory::new();
    let loader = loader(options(Some(script)), &factory);

    let context = loader.context().unwrap();
    let summary = loader.run_with(&context).unwrap();
    assert!(!summary.success);
    assert!(!context.no_error());
    assert_eq!(context.mode(), LoadMode::Idle);
    assert_eq!(factory.releases(), 1);
}

#[test]
fn test_unreadable_schema_file_fails_run() {
    let dir = TempDir::new().unwrap();
    let factory = RecordingFactory::new();
    let loader = loader(options(Some(dir.path().join("missing.script"))), &factory);

    let summary = loader.execute().unwrap();
    assert!(!summary.success);
    assert!(summary.error.unwrap().contains("Failed to read schema file"));
    assert_eq!(factory.clients_created(), 0);
}

#[test]
fn test_context_closed_exactly_once_across_runs_of_close() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "schema.vertexLabel(\"person\").create()");
    let factory = RecordingFactory::new();
    let loader = loader(options(Some(script)), &factory);

    let context = loader.context().unwrap();
    loader.run_with(&context).unwrap();
    for tag in ["schema", "hook", "schema"] {
        assert!(!context.close(tag));
        assert!(context.closed());
    }
    assert_eq!(factory.releases(), 1);
}
