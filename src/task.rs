//! Task Manager
//!
//! Runs asynchronous load tasks on a dedicated worker runtime with bounded concurrency.
//! The lifecycle is one-way: accepting -> draining -> shut down. Once `stop_accepting`
//! has been called no new task is admitted, `wait_finished` blocks until every admitted
//! task has ended, and `shutdown` releases the worker threads.

use crate::error::LoadError;
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Identifier handed out for each admitted task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// Counters over the lifetime of a manager
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub submitted: u64,
    pub running: u64,
    pub completed: u64,
    /// Tasks that returned an error, panicked or were cancelled by shutdown
    pub failed: u64,
}

type FailureHook = Box<dyn Fn(&str, &LoadError) + Send + Sync>;

#[derive(Default)]
struct TaskState {
    accepting: bool,
    in_flight: usize,
    stats: TaskStats,
}

struct Shared {
    state: Mutex<TaskState>,
    finished: Condvar,
    on_failure: Option<FailureHook>,
}

/// Decrements the in-flight count however the task ends, including cancellation.
struct InFlight {
    shared: Arc<Shared>,
    name: String,
    started: bool,
    succeeded: Option<bool>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        // Reached without an outcome: the task panicked or was cancelled.
        if self.succeeded.is_none() {
            let err = LoadError::TaskAborted(format!(
                "task '{}' panicked or was cancelled",
                self.name
            ));
            warn!(task = %self.name, error = %err, "Task failed");
            if let Some(hook) = &self.shared.on_failure {
                hook(&self.name, &err);
            }
        }
        let mut state = self.shared.state.lock();
        if self.started {
            state.stats.running = state.stats.running.saturating_sub(1);
        }
        match self.succeeded {
            Some(true) => state.stats.completed += 1,
            _ => state.stats.failed += 1,
        }
        state.in_flight -= 1;
        if state.in_flight == 0 {
            self.shared.finished.notify_all();
        }
    }
}

pub struct TaskManager {
    shared: Arc<Shared>,
    runtime: Mutex<Option<Runtime>>,
    permits: Arc<Semaphore>,
    shutdown_timeout: Duration,
    next_id: AtomicU64,
}

impl TaskManager {
    /// Create a manager with `threads` workers; at most `threads` tasks run at once.
    pub fn new(threads: usize, shutdown_timeout: Duration) -> Result<Self, LoadError> {
        Self::build(threads, shutdown_timeout, None)
    }

    /// Like `new`, calling `hook` with the task name and error whenever a task fails.
    pub fn with_failure_hook<H>(
        threads: usize,
        shutdown_timeout: Duration,
        hook: H,
    ) -> Result<Self, LoadError>
    where
        H: Fn(&str, &LoadError) + Send + Sync + 'static,
    {
        Self::build(threads, shutdown_timeout, Some(Box::new(hook)))
    }

    fn build(
        threads: usize,
        shutdown_timeout: Duration,
        on_failure: Option<FailureHook>,
    ) -> Result<Self, LoadError> {
        let threads = threads.max(1);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(threads)
            .thread_name("schema-loader-task")
            .enable_all()
            .build()
            .map_err(|e| LoadError::Config(format!("Failed to start task workers: {}", e)))?;
        debug!(threads, "Started task manager");

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(TaskState {
                    accepting: true,
                    ..TaskState::default()
                }),
                finished: Condvar::new(),
                on_failure,
            }),
            runtime: Mutex::new(Some(runtime)),
            permits: Arc::new(Semaphore::new(threads)),
            shutdown_timeout,
            next_id: AtomicU64::new(1),
        })
    }

    /// Admit `task` for execution. Rejected once the manager stopped accepting.
    pub fn submit<F>(&self, name: &str, task: F) -> Result<TaskId, LoadError>
    where
        F: Future<Output = Result<(), LoadError>> + Send + 'static,
    {
        // Admission check and in-flight increment happen under one lock so a
        // concurrent wait_finished never misses an admitted task.
        let mut state = self.shared.state.lock();
        if !state.accepting {
            return Err(LoadError::TaskRejected(format!(
                "task '{}' submitted after loading stopped",
                name
            )));
        }
        let runtime = self.runtime.lock();
        let handle = match runtime.as_ref() {
            Some(runtime) => runtime.handle().clone(),
            None => {
                return Err(LoadError::TaskRejected(format!(
                    "task '{}' submitted after shutdown",
                    name
                )))
            }
        };
        drop(runtime);

        state.in_flight += 1;
        state.stats.submitted += 1;
        drop(state);

        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut guard = InFlight {
            shared: Arc::clone(&self.shared),
            name: name.to_string(),
            started: false,
            succeeded: None,
        };
        let permits = Arc::clone(&self.permits);
        debug!(task = %name, id = id.0, "Admitted task");

        handle.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            guard.shared.state.lock().stats.running += 1;
            guard.started = true;

            let result = task.await;
            if let Err(err) = &result {
                warn!(task = %guard.name, error = %err, "Task failed");
                if let Some(hook) = &guard.shared.on_failure {
                    hook(&guard.name, err);
                }
            }
            guard.succeeded = Some(result.is_ok());
        });

        Ok(id)
    }

    /// Stop admitting tasks. Idempotent.
    pub fn stop_accepting(&self) {
        let mut state = self.shared.state.lock();
        if state.accepting {
            state.accepting = false;
            debug!(in_flight = state.in_flight, "Task manager stopped accepting tasks");
        }
    }

    /// Block until no admitted task is pending or running.
    pub fn wait_finished(&self) {
        let mut state = self.shared.state.lock();
        while state.in_flight > 0 {
            self.shared.finished.wait(&mut state);
        }
    }

    /// Release the worker threads. Idempotent; tasks still running after the
    /// shutdown timeout are cancelled and reported as a teardown error.
    pub fn shutdown(&self) -> Result<(), LoadError> {
        self.stop_accepting();
        let runtime = self.runtime.lock().take();
        let Some(runtime) = runtime else {
            return Ok(());
        };
        let pending = self.shared.state.lock().in_flight;
        runtime.shutdown_timeout(self.shutdown_timeout);
        info!("Task manager shut down");
        if pending > 0 {
            return Err(LoadError::Teardown(format!(
                "{} task(s) were still pending when shutdown started",
                pending
            )));
        }
        Ok(())
    }

    pub fn is_shutdown(&self) -> bool {
        self.runtime.lock().is_none()
    }

    pub fn stats(&self) -> TaskStats {
        self.shared.state.lock().stats.clone()
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.get_mut().take() {
            runtime.shutdown_background();
        }
    }
}
