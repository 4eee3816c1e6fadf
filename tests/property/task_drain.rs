//! `wait_finished` returns only after every submitted task completed

use graph_schema_loader::error::LoadError;
use graph_schema_loader::task::TaskManager;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn wait_finished_observes_all_tasks(
        delays in prop::collection::vec(0u64..15, 0..12),
        threads in 1usize..4,
        failures in prop::collection::vec(any::<bool>(), 12),
    ) {
        let manager = TaskManager::new(threads, Duration::from_secs(5)).unwrap();
        let done = Arc::new(AtomicUsize::new(0));

        for (i, delay) in delays.iter().copied().enumerate() {
            let done = Arc::clone(&done);
            let fail = failures[i];
            manager
                .submit(&format!("task-{}", i), async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    done.fetch_add(1, Ordering::SeqCst);
                    if fail {
                        Err(LoadError::RemoteService("rejected".to_string()))
                    } else {
                        Ok(())
                    }
                })
                .unwrap();
        }
        manager.stop_accepting();
        manager.wait_finished();

        prop_assert_eq!(done.load(Ordering::SeqCst), delays.len());
        let stats = manager.stats();
        prop_assert_eq!(stats.submitted as usize, delays.len());
        prop_assert_eq!((stats.completed + stats.failed) as usize, delays.len());
        prop_assert_eq!(stats.running, 0);
        prop_assert!(manager.shutdown().is_ok());
    }
}
