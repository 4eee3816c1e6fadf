//! Load Context
//!
//! Run-scoped state of one schema load: options (with the temporarily overridable
//! timeout), loading mode, stage, error flag, the lazily created graph client, the
//! schema cache and the task manager. `close` is the single teardown routine shared by
//! the coordinator thread and the interrupt handler; it performs its release sequence
//! exactly once.

use crate::client::{ClientFactory, GraphClient, SchemaKind, SchemaSnapshot};
use crate::config::LoadOptions;
use crate::error::LoadError;
use crate::task::{TaskManager, TaskStats};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    Idle,
    Loading,
}

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStage {
    Init,
    Loading,
    Clearing,
    SchemaCreating,
    CacheRefresh,
    Teardown,
    Closed,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadStage::Init => "init",
            LoadStage::Loading => "loading",
            LoadStage::Clearing => "clearing",
            LoadStage::SchemaCreating => "schema-creating",
            LoadStage::CacheRefresh => "cache-refresh",
            LoadStage::Teardown => "teardown",
            LoadStage::Closed => "closed",
        };
        f.write_str(name)
    }
}

enum ClientSlot {
    Empty,
    Ready(Arc<GraphClient>),
    Released,
}

pub struct LoadContext {
    options: RwLock<LoadOptions>,
    factory: Arc<dyn ClientFactory>,
    tasks: TaskManager,
    mode: Mutex<LoadMode>,
    stage: Mutex<LoadStage>,
    error: Arc<AtomicBool>,
    client: Mutex<ClientSlot>,
    cache: RwLock<SchemaSnapshot>,
    /// Held for the whole release sequence
    teardown: Mutex<()>,
    closed: AtomicBool,
}

impl LoadContext {
    pub fn new(options: LoadOptions, factory: Arc<dyn ClientFactory>) -> Result<Self, LoadError> {
        let error = Arc::new(AtomicBool::new(false));
        let task_error = Arc::clone(&error);
        let tasks = TaskManager::with_failure_hook(
            options.task_threads,
            Duration::from_secs(options.shutdown_timeout),
            move |_, _| task_error.store(true, Ordering::SeqCst),
        )?;

        Ok(Self {
            options: RwLock::new(options),
            factory,
            tasks,
            mode: Mutex::new(LoadMode::Idle),
            stage: Mutex::new(LoadStage::Init),
            error,
            client: Mutex::new(ClientSlot::Empty),
            cache: RwLock::new(SchemaSnapshot::default()),
            teardown: Mutex::new(()),
            closed: AtomicBool::new(false),
        })
    }

    /// Snapshot of the current options
    pub fn options(&self) -> LoadOptions {
        self.options.read().clone()
    }

    pub fn graph(&self) -> String {
        self.options.read().graph.clone()
    }

    /// Current request timeout in seconds
    pub fn timeout(&self) -> u64 {
        self.options.read().timeout
    }

    /// Replace the request timeout until the returned guard is dropped.
    pub fn override_timeout(&self, seconds: u64) -> TimeoutOverride<'_> {
        let previous = {
            let mut options = self.options.write();
            std::mem::replace(&mut options.timeout, seconds)
        };
        debug!(timeout = seconds, previous, "Overrode request timeout");
        TimeoutOverride {
            context: self,
            previous,
        }
    }

    pub fn mode(&self) -> LoadMode {
        *self.mode.lock()
    }

    /// Enter loading mode. Ignored once teardown has started.
    pub fn set_loading_mode(&self) {
        // Excluded from the teardown sequence so the switch cannot land after
        // teardown left loading mode.
        let Some(_teardown) = self.teardown.try_lock() else {
            warn!("Ignoring loading mode switch during teardown");
            return;
        };
        if self.closed() {
            warn!("Ignoring loading mode switch on a closed context");
            return;
        }
        let mut mode = self.mode.lock();
        if *mode == LoadMode::Loading {
            return;
        }
        *mode = LoadMode::Loading;
        drop(mode);
        self.set_stage(LoadStage::Loading);
        info!(graph = %self.graph(), "Switched to loading mode");
    }

    pub fn unset_loading_mode(&self) {
        let mut mode = self.mode.lock();
        if *mode == LoadMode::Idle {
            return;
        }
        *mode = LoadMode::Idle;
        info!(graph = %self.graph(), "Left loading mode");
    }

    pub fn stage(&self) -> LoadStage {
        *self.stage.lock()
    }

    pub(crate) fn set_stage(&self, stage: LoadStage) {
        let mut current = self.stage.lock();
        let from = *current;
        // Teardown only moves on to Closed; Closed is terminal.
        let allowed = match from {
            LoadStage::Closed => false,
            LoadStage::Teardown => stage == LoadStage::Closed,
            _ => true,
        };
        if allowed {
            debug!(from = %from, to = %stage, "Stage transition");
            *current = stage;
        }
    }

    /// Record that the run failed. Never cleared.
    pub fn occur_error(&self) {
        self.error.store(true, Ordering::SeqCst);
    }

    pub fn no_error(&self) -> bool {
        !self.error.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Fail with `ContextClosed` once teardown has run
    pub fn ensure_open(&self) -> Result<(), LoadError> {
        if self.closed() {
            Err(LoadError::ContextClosed(format!(
                "load of graph '{}' was shut down",
                self.graph()
            )))
        } else {
            Ok(())
        }
    }

    /// The run's graph client, created on first use with the current options.
    pub fn client(&self) -> Result<Arc<GraphClient>, LoadError> {
        let mut slot = self.client.lock();
        match &*slot {
            ClientSlot::Ready(client) => return Ok(Arc::clone(client)),
            ClientSlot::Released => {
                return Err(LoadError::ContextClosed(
                    "graph client has been released".to_string(),
                ))
            }
            ClientSlot::Empty => {}
        }
        let client = Arc::new(self.factory.create(&self.options())?);
        debug!(
            graph = %client.graph(),
            timeout_secs = client.timeout().as_secs(),
            "Created graph client"
        );
        *slot = ClientSlot::Ready(Arc::clone(&client));
        Ok(client)
    }

    pub fn client_created(&self) -> bool {
        matches!(*self.client.lock(), ClientSlot::Ready(_))
    }

    pub fn tasks(&self) -> &TaskManager {
        &self.tasks
    }

    pub fn task_stats(&self) -> TaskStats {
        self.tasks.stats()
    }

    pub fn schema_cache(&self) -> SchemaSnapshot {
        self.cache.read().clone()
    }

    /// Re-fetch the remote schema into the local cache
    pub fn update_schema_cache(&self) -> Result<(), LoadError> {
        let client = self.client()?;
        let snapshot = client.fetch_schema()?;
        info!(
            graph = %client.graph(),
            property_keys = snapshot.count(SchemaKind::PropertyKey),
            vertex_labels = snapshot.count(SchemaKind::VertexLabel),
            edge_labels = snapshot.count(SchemaKind::EdgeLabel),
            index_labels = snapshot.count(SchemaKind::IndexLabel),
            "Refreshed schema cache"
        );
        *self.cache.write() = snapshot;
        Ok(())
    }

    /// Stop admitting new tasks; accepted tasks keep running.
    pub fn stop_loading(&self) {
        self.tasks.stop_accepting();
    }

    /// Tear the run down. Only the first call does any work and returns `true`;
    /// every other call, concurrent or later, returns `false` once that work is done.
    pub fn close(&self, tag: &str) -> bool {
        let _teardown = self.teardown.lock();
        if self.closed() {
            debug!(tag, "Context already closed");
            return false;
        }

        self.set_stage(LoadStage::Teardown);
        info!(tag, "Stop loading then shutdown");
        self.stop_loading();
        self.tasks.wait_finished();
        if let Err(err) = self.tasks.shutdown() {
            error!(tag, error = %err, "Teardown step failed");
        }
        self.unset_loading_mode();
        self.release_client(tag);

        self.closed.store(true, Ordering::SeqCst);
        self.set_stage(LoadStage::Closed);
        info!(tag, "Load context closed");
        true
    }

    fn release_client(&self, tag: &str) {
        let previous = std::mem::replace(&mut *self.client.lock(), ClientSlot::Released);
        if let ClientSlot::Ready(client) = previous {
            if !client.close() {
                let err = LoadError::Teardown("graph client was already closed".to_string());
                error!(tag, error = %err, "Teardown step failed");
            }
        }
    }
}

/// Restores the previous timeout on drop, including on early return and unwinding.
pub struct TimeoutOverride<'a> {
    context: &'a LoadContext,
    previous: u64,
}

impl Drop for TimeoutOverride<'_> {
    fn drop(&mut self) {
        self.context.options.write().timeout = self.previous;
        debug!(timeout = self.previous, "Restored request timeout");
    }
}
