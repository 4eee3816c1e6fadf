//! Interrupt delivery
//!
//! A process can only install one termination handler, while each run owns its own
//! `LoadContext`. `ShutdownHooks` keeps weak references to live contexts and closes
//! them all when triggered, through the same `close` used on the normal path.

use crate::context::LoadContext;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use tracing::{info, warn};

/// Exit status after an interrupt (128 + SIGINT)
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Default)]
pub struct ShutdownHooks {
    contexts: Mutex<Vec<(u64, Weak<LoadContext>)>>,
    next_id: AtomicU64,
}

impl ShutdownHooks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Process-wide registry wired to SIGINT/SIGTERM/SIGHUP.
    ///
    /// The first call installs the handler. When the signal arrives the handler thread
    /// closes every registered context and exits the process.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<ShutdownHooks>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| {
            let hooks = ShutdownHooks::new();
            let handler_hooks = Arc::clone(&hooks);
            let installed = ctrlc::set_handler(move || {
                info!("Shutdown hook was triggered");
                handler_hooks.trigger("hook");
                std::process::exit(INTERRUPTED_EXIT_CODE);
            });
            if let Err(err) = installed {
                warn!(error = %err, "Failed to install termination handler");
            }
            hooks
        }))
    }

    /// Close `context` when this registry is triggered, until the guard is dropped.
    pub fn register(self: &Arc<Self>, context: &Arc<LoadContext>) -> HookGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut contexts = self.contexts.lock();
        contexts.retain(|(_, weak)| weak.strong_count() > 0);
        contexts.push((id, Arc::downgrade(context)));
        HookGuard {
            hooks: Arc::clone(self),
            id,
        }
    }

    /// Close every live registered context. Returns how many closes did the teardown.
    pub fn trigger(&self, tag: &str) -> usize {
        let live: Vec<Arc<LoadContext>> = self
            .contexts
            .lock()
            .iter()
            .filter_map(|(_, weak)| weak.upgrade())
            .collect();
        live.iter().filter(|context| context.close(tag)).count()
    }

    pub fn len(&self) -> usize {
        self.contexts
            .lock()
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registration of one context; unregisters on drop.
pub struct HookGuard {
    hooks: Arc<ShutdownHooks>,
    id: u64,
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        self.hooks.contexts.lock().retain(|(id, _)| *id != self.id);
    }
}
