//! Any number of concurrent closers perform the release sequence once

use graph_schema_loader::client::DryRunClientFactory;
use graph_schema_loader::config::LoadOptions;
use graph_schema_loader::context::{LoadContext, LoadMode, LoadStage};
use proptest::prelude::*;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn close_is_performed_exactly_once(
        closers in 1usize..8,
        with_client in any::<bool>(),
        pending_task_ms in prop::option::of(0u64..20),
    ) {
        let options = LoadOptions {
            task_threads: 1,
            ..LoadOptions::default()
        };
        let context = Arc::new(
            LoadContext::new(options, Arc::new(DryRunClientFactory::default())).unwrap(),
        );
        context.set_loading_mode();
        let client = if with_client { Some(context.client().unwrap()) } else { None };
        if let Some(ms) = pending_task_ms {
            context
                .tasks()
                .submit("pending", async move {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(())
                })
                .unwrap();
        }

        let barrier = Arc::new(Barrier::new(closers));
        let handles: Vec<_> = (0..closers)
            .map(|i| {
                let context = Arc::clone(&context);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let tag = if i % 2 == 0 { "schema" } else { "hook" };
                    let performed = context.close(tag);
                    // Every caller returns only after teardown is complete.
                    assert!(context.closed());
                    performed
                })
            })
            .collect();
        let performed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|p| *p)
            .count();

        prop_assert_eq!(performed, 1);
        prop_assert!(!context.close("late"));
        prop_assert_eq!(context.mode(), LoadMode::Idle);
        prop_assert_eq!(context.stage(), LoadStage::Closed);
        prop_assert!(context.tasks().is_shutdown());
        if let Some(client) = client {
            prop_assert!(client.is_closed());
        }
        if pending_task_ms.is_some() {
            prop_assert_eq!(context.task_stats().completed, 1);
        }
    }
}
