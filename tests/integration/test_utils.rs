//! Shared test utilities for integration tests
//!
//! `RecordingFactory` hands out clients over one in-memory graph and records, per
//! client, the timeout it was built with, every clear request and every release.

use async_trait::async_trait;
use graph_schema_loader::client::schema::{SchemaElement, SchemaKind, SchemaSnapshot};
use graph_schema_loader::client::{ClientFactory, GraphClient, GraphService, InMemoryGraphService};
use graph_schema_loader::config::LoadOptions;
use graph_schema_loader::error::LoadError;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A client was built with this request timeout (seconds)
    ClientCreated { timeout: u64 },
    Clear { graph: String, timeout: u64 },
    Released { timeout: u64 },
}

#[derive(Default)]
pub struct RecordingFactory {
    service: Arc<InMemoryGraphService>,
    events: Arc<Mutex<Vec<Event>>>,
    fail_clear: bool,
    clear_delay: Option<Duration>,
}

impl RecordingFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Clear requests are rejected by the service
    pub fn failing_clear() -> Arc<Self> {
        Arc::new(Self {
            fail_clear: true,
            ..Self::default()
        })
    }

    /// Clear requests take `delay` before completing
    pub fn slow_clear(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            clear_delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn clients_created(&self) -> usize {
        self.count(|e| matches!(e, Event::ClientCreated { .. }))
    }

    pub fn clears(&self) -> usize {
        self.count(|e| matches!(e, Event::Clear { .. }))
    }

    pub fn releases(&self) -> usize {
        self.count(|e| matches!(e, Event::Released { .. }))
    }

    pub fn snapshot(&self, graph: &str) -> SchemaSnapshot {
        self.service.snapshot(graph)
    }

    fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }
}

impl ClientFactory for RecordingFactory {
    fn create(&self, options: &LoadOptions) -> Result<GraphClient, LoadError> {
        self.events.lock().push(Event::ClientCreated {
            timeout: options.timeout,
        });
        let service = RecordingService {
            inner: Arc::clone(&self.service),
            events: Arc::clone(&self.events),
            timeout: options.timeout,
            fail_clear: self.fail_clear,
            clear_delay: self.clear_delay,
        };
        GraphClient::new(Arc::new(service), &options.graph, options.request_timeout())
    }
}

struct RecordingService {
    inner: Arc<InMemoryGraphService>,
    events: Arc<Mutex<Vec<Event>>>,
    timeout: u64,
    fail_clear: bool,
    clear_delay: Option<Duration>,
}

#[async_trait]
impl GraphService for RecordingService {
    async fn clear_graph(&self, graph: &str, confirm_message: &str) -> Result<(), LoadError> {
        self.events.lock().push(Event::Clear {
            graph: graph.to_string(),
            timeout: self.timeout,
        });
        if let Some(delay) = self.clear_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_clear {
            return Err(LoadError::RemoteService(
                "Clear graph failed (500): backend unavailable".to_string(),
            ));
        }
        self.inner.clear_graph(graph, confirm_message).await
    }

    async fn create_schema(
        &self,
        graph: &str,
        element: &SchemaElement,
    ) -> Result<SchemaElement, LoadError> {
        self.inner.create_schema(graph, element).await
    }

    async fn get_schema(
        &self,
        graph: &str,
        kind: SchemaKind,
        name: &str,
    ) -> Result<Option<SchemaElement>, LoadError> {
        self.inner.get_schema(graph, kind, name).await
    }

    async fn remove_schema(
        &self,
        graph: &str,
        kind: SchemaKind,
        name: &str,
    ) -> Result<(), LoadError> {
        self.inner.remove_schema(graph, kind, name).await
    }

    async fn list_schema(&self, graph: &str) -> Result<SchemaSnapshot, LoadError> {
        self.inner.list_schema(graph).await
    }

    fn release(&self) {
        self.events.lock().push(Event::Released {
            timeout: self.timeout,
        });
    }
}

/// Write `content` as a schema script inside `dir`
pub fn write_script(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("defs.script");
    std::fs::write(&path, content).unwrap();
    path
}

/// Options for graph `g1` with fast teardown
pub fn options(schema: Option<PathBuf>) -> LoadOptions {
    LoadOptions {
        graph: "g1".to_string(),
        schema,
        timeout: 60,
        clear_timeout: 240,
        task_threads: 2,
        shutdown_timeout: 5,
        ..LoadOptions::default()
    }
}
