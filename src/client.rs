//! Graph Service Client
//!
//! `GraphService` is the async seam to the graph server (REST or in-memory). `GraphClient`
//! wraps a service with a private runtime so the synchronous load lifecycle can drive it, and
//! owns the close-once semantics of the connection.

use crate::config::LoadOptions;
use crate::error::LoadError;
use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub mod http;
pub mod memory;
pub mod schema;

pub use http::HttpGraphService;
pub use memory::InMemoryGraphService;
pub use schema::{SchemaElement, SchemaKind, SchemaSnapshot};

/// Phrase the server requires before it erases a graph.
pub const CLEAR_CONFIRM_MESSAGE: &str = "I'm sure to delete all data";

/// Remote graph operations used by the loader
#[async_trait]
pub trait GraphService: Send + Sync {
    /// Erase all data of `graph`; rejected unless `confirm_message` matches.
    async fn clear_graph(&self, graph: &str, confirm_message: &str) -> Result<(), LoadError>;

    async fn create_schema(
        &self,
        graph: &str,
        element: &SchemaElement,
    ) -> Result<SchemaElement, LoadError>;

    async fn get_schema(
        &self,
        graph: &str,
        kind: SchemaKind,
        name: &str,
    ) -> Result<Option<SchemaElement>, LoadError>;

    async fn remove_schema(&self, graph: &str, kind: SchemaKind, name: &str)
        -> Result<(), LoadError>;

    /// Every schema element of `graph`
    async fn list_schema(&self, graph: &str) -> Result<SchemaSnapshot, LoadError>;

    /// Called once when the owning client is closed.
    fn release(&self) {}
}

struct ClientCore {
    service: Arc<dyn GraphService>,
    runtime: tokio::runtime::Runtime,
    graph: String,
    closed: AtomicBool,
}

impl ClientCore {
    fn call<T, F>(&self, future: F) -> Result<T, LoadError>
    where
        F: Future<Output = Result<T, LoadError>>,
    {
        if self.closed.load(Ordering::SeqCst) {
            return Err(LoadError::ContextClosed(format!(
                "client for graph '{}' has been closed",
                self.graph
            )));
        }
        self.runtime.block_on(future)
    }
}

/// Synchronous handle to one graph on the server
pub struct GraphClient {
    core: Arc<ClientCore>,
    timeout: Duration,
}

impl GraphClient {
    /// Wrap `service`; `timeout` is the request timeout the service was built with.
    pub fn new(
        service: Arc<dyn GraphService>,
        graph: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LoadError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LoadError::RemoteService(format!("Failed to create runtime: {}", e)))?;
        Ok(Self {
            core: Arc::new(ClientCore {
                service,
                runtime,
                graph: graph.into(),
                closed: AtomicBool::new(false),
            }),
            timeout,
        })
    }

    pub fn graph(&self) -> &str {
        &self.core.graph
    }

    /// Request timeout this client was created with
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn clear_graph(&self, graph: &str, confirm_message: &str) -> Result<(), LoadError> {
        self.core
            .call(self.core.service.clear_graph(graph, confirm_message))
    }

    /// Fetch the full remote schema of this client's graph
    pub fn fetch_schema(&self) -> Result<SchemaSnapshot, LoadError> {
        self.core.call(self.core.service.list_schema(&self.core.graph))
    }

    /// Schema-mutation handle bound to this client
    pub fn schema(&self) -> SchemaHandle {
        SchemaHandle {
            core: Arc::clone(&self.core),
        }
    }

    /// Close the client. Returns `true` only for the call that performed the close.
    pub fn close(&self) -> bool {
        let released = !self.core.closed.swap(true, Ordering::SeqCst);
        if released {
            self.core.service.release();
            info!(graph = %self.core.graph, "Closed graph client");
        }
        released
    }

    pub fn is_closed(&self) -> bool {
        self.core.closed.load(Ordering::SeqCst)
    }
}

/// Result of a create request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(SchemaElement),
    /// `ifNotExist` was requested and the element was already present
    Existed(SchemaElement),
}

/// Schema-mutation handle handed to scripts
#[derive(Clone)]
pub struct SchemaHandle {
    core: Arc<ClientCore>,
}

impl SchemaHandle {
    pub fn graph(&self) -> &str {
        &self.core.graph
    }

    pub fn create(
        &self,
        element: &SchemaElement,
        if_not_exist: bool,
    ) -> Result<CreateOutcome, LoadError> {
        let graph = &self.core.graph;
        if if_not_exist {
            let existing = self.core.call(self.core.service.get_schema(
                graph,
                element.kind(),
                element.name(),
            ))?;
            if let Some(existing) = existing {
                debug!(kind = %element.kind(), name = element.name(), "Schema element already exists");
                return Ok(CreateOutcome::Existed(existing));
            }
        }
        let created = self
            .core
            .call(self.core.service.create_schema(graph, element))?;
        Ok(CreateOutcome::Created(created))
    }

    pub fn remove(&self, kind: SchemaKind, name: &str) -> Result<(), LoadError> {
        self.core
            .call(self.core.service.remove_schema(&self.core.graph, kind, name))
    }
}

/// Builds graph clients from run options
pub trait ClientFactory: Send + Sync {
    fn create(&self, options: &LoadOptions) -> Result<GraphClient, LoadError>;
}

/// Clients that talk to the graph server over HTTP
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpClientFactory;

impl ClientFactory for HttpClientFactory {
    fn create(&self, options: &LoadOptions) -> Result<GraphClient, LoadError> {
        let service = HttpGraphService::new(options)?;
        debug!(
            base_url = %options.base_url(),
            graph = %options.graph,
            timeout_secs = options.timeout,
            "Created HTTP graph client"
        );
        GraphClient::new(Arc::new(service), &options.graph, options.request_timeout())
    }
}

/// Clients over one shared in-memory graph, for `--dry-run`
#[derive(Clone, Default)]
pub struct DryRunClientFactory {
    service: Arc<InMemoryGraphService>,
}

impl DryRunClientFactory {
    pub fn new(service: Arc<InMemoryGraphService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<InMemoryGraphService> {
        &self.service
    }
}

impl ClientFactory for DryRunClientFactory {
    fn create(&self, options: &LoadOptions) -> Result<GraphClient, LoadError> {
        let service: Arc<dyn GraphService> = self.service.clone();
        GraphClient::new(service, &options.graph, options.request_timeout())
    }
}

/// Factory matching the run mode
pub fn factory_for(options: &LoadOptions) -> Arc<dyn ClientFactory> {
    if options.dry_run {
        Arc::new(DryRunClientFactory::default())
    } else {
        Arc::new(HttpClientFactory)
    }
}
