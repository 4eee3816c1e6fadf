//! Interrupt delivery racing the coordinator's own teardown

use super::test_utils::{options, write_script, RecordingFactory};
use graph_schema_loader::context::LoadContext;
use graph_schema_loader::shutdown::ShutdownHooks;
use graph_schema_loader::SchemaLoader;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_hook_and_coordinator_close_concurrently() {
    let factory = RecordingFactory::new();
    let context = Arc::new(LoadContext::new(options(None), factory.clone()).unwrap());
    let hooks = ShutdownHooks::new();
    let _guard = hooks.register(&context);

    context.set_loading_mode();
    context.client().unwrap();
    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);
    context
        .tasks()
        .submit("slow-load", async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let hook_thread = {
        let hooks = Arc::clone(&hooks);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            hooks.trigger("hook")
        })
    };
    barrier.wait();
    let coordinator_closed = context.close("schema");
    let hook_closed = hook_thread.join().unwrap();

    assert_eq!(usize::from(coordinator_closed) + hook_closed, 1);
    assert!(context.closed());
    assert!(finished.load(Ordering::SeqCst), "accepted work runs to completion");
    assert_eq!(factory.releases(), 1);
    assert_eq!(context.task_stats().completed, 1);
}

#[test]
fn test_interrupt_before_run_fails_run() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "schema.vertexLabel(\"person\").create()");
    let factory = RecordingFactory::new();
    let loader = SchemaLoader::with_factory(options(Some(script)), factory.clone())
        .with_shutdown_hooks(ShutdownHooks::new());

    let context = loader.context().unwrap();
    assert!(context.close("hook"));
    let summary = loader.run_with(&context).unwrap();

    assert!(!summary.success);
    assert_eq!(factory.clients_created(), 0);
    assert!(factory.snapshot("g1").is_empty());
}

#[test]
fn test_interrupt_during_clear() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "schema.vertexLabel(\"person\").create()");
    let factory = RecordingFactory::slow_clear(Duration::from_millis(300));
    let mut opts = options(Some(script));
    opts.clear_all_data = true;
    let hooks = ShutdownHooks::new();
    let loader =
        SchemaLoader::with_factory(opts, factory.clone()).with_shutdown_hooks(Arc::clone(&hooks));

    let interrupter = {
        let hooks = Arc::clone(&hooks);
        thread::spawn(move || {
            while hooks.is_empty() {
                thread::sleep(Duration::from_millis(5));
            }
            thread::sleep(Duration::from_millis(50));
            hooks.trigger("hook")
        })
    };

    let context = loader.context().unwrap();
    let summary = loader.run_with(&context).unwrap();
    let closed_by_hook = interrupter.join().unwrap();

    assert_eq!(closed_by_hook, 1);
    assert!(!summary.success);
    assert!(context.closed());
    assert_eq!(context.timeout(), 60);
    // Only the clear client existed and it was released once.
    assert_eq!(factory.clients_created(), 1);
    assert_eq!(factory.releases(), 1);
}

#[test]
fn test_tasks_rejected_after_interrupt() {
    let factory = RecordingFactory::new();
    let context = Arc::new(LoadContext::new(options(None), factory).unwrap());
    let hooks = ShutdownHooks::new();
    let _guard = hooks.register(&context);

    assert_eq!(hooks.trigger("hook"), 1);
    let result = context.tasks().submit("late", async { Ok(()) });
    assert!(result.is_err());
}
