//! Schema Loader
//!
//! Coordinates one provisioning run on the caller's thread:
//! loading mode -> optional destructive clear -> schema script -> cache refresh,
//! always followed by the context teardown.

use crate::client::{factory_for, ClientFactory, SchemaKind, SchemaSnapshot, CLEAR_CONFIRM_MESSAGE};
use crate::config::LoadOptions;
use crate::context::{LoadContext, LoadStage};
use crate::error::LoadError;
use crate::script::{ExecutionReport, ScriptRunner};
use crate::shutdown::ShutdownHooks;
use crate::task::TaskStats;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Name under which the schema-mutation handle is visible to scripts
pub const SCHEMA_BINDING: &str = "schema";

/// Tag the coordinator's own teardown is logged under
pub const TEARDOWN_TAG: &str = "schema";

/// Message every run failure is normalized under
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load schema";

/// Schema element counts of the refreshed cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaCounts {
    pub property_keys: usize,
    pub vertex_labels: usize,
    pub edge_labels: usize,
    pub index_labels: usize,
}

impl From<&SchemaSnapshot> for SchemaCounts {
    fn from(snapshot: &SchemaSnapshot) -> Self {
        Self {
            property_keys: snapshot.count(SchemaKind::PropertyKey),
            vertex_labels: snapshot.count(SchemaKind::VertexLabel),
            edge_labels: snapshot.count(SchemaKind::EdgeLabel),
            index_labels: snapshot.count(SchemaKind::IndexLabel),
        }
    }
}

/// Outcome of one run, for reporting
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub graph: String,
    pub success: bool,
    pub dry_run: bool,
    pub cleared: bool,
    /// RFC 3339, UTC
    pub started_at: String,
    pub duration_ms: u64,
    pub counts: SchemaCounts,
    pub script: Option<ExecutionReport>,
    pub tasks: TaskStats,
    pub error: Option<String>,
    #[serde(skip)]
    pub schema: SchemaSnapshot,
}

/// Sequences one schema provisioning run
pub struct SchemaLoader {
    options: LoadOptions,
    factory: Arc<dyn ClientFactory>,
    /// Falls back to the process-wide registry
    hooks: Option<Arc<ShutdownHooks>>,
}

#[derive(Default)]
struct Progress {
    cleared: bool,
    script: Option<ExecutionReport>,
}

impl SchemaLoader {
    /// Loader for `options`, talking HTTP (or in-memory for dry runs). Runs are wired
    /// to the process termination handler unless other hooks are given.
    pub fn new(options: LoadOptions) -> Self {
        let factory = factory_for(&options);
        Self::with_factory(options, factory)
    }

    pub fn with_factory(options: LoadOptions, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            options,
            factory,
            hooks: None,
        }
    }

    /// Use `hooks` instead of the process-wide registry.
    pub fn with_shutdown_hooks(mut self, hooks: Arc<ShutdownHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Fresh context for a run of this loader
    pub fn context(&self) -> Result<Arc<LoadContext>, LoadError> {
        Ok(Arc::new(LoadContext::new(
            self.options.clone(),
            Arc::clone(&self.factory),
        )?))
    }

    /// Run once. `Ok(true)` iff no error was recorded; in test mode a failure is
    /// returned as the normalized error after teardown.
    pub fn run(&self) -> Result<bool, LoadError> {
        self.execute().map(|summary| summary.success)
    }

    /// Run once, returning the full summary
    pub fn execute(&self) -> Result<LoadSummary, LoadError> {
        let context = self.context()?;
        self.run_with(&context)
    }

    /// Run in `context`, which is closed before this returns.
    pub fn run_with(&self, context: &Arc<LoadContext>) -> Result<LoadSummary, LoadError> {
        let started = Instant::now();
        let started_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let hooks = self.hooks.clone().unwrap_or_else(ShutdownHooks::global);
        let _hook = hooks.register(context);

        let mut progress = Progress::default();
        let failure = match self.load(context, &mut progress) {
            Ok(()) => None,
            Err(err) => {
                let err = err.normalize(LOAD_FAILED_MESSAGE);
                error!(graph = %self.options.graph, error = %err, "Schema load failed");
                context.occur_error();
                Some(err)
            }
        };

        context.close(TEARDOWN_TAG);

        let schema = context.schema_cache();
        let summary = LoadSummary {
            graph: self.options.graph.clone(),
            success: context.no_error(),
            dry_run: self.options.dry_run,
            cleared: progress.cleared,
            started_at,
            duration_ms: started.elapsed().as_millis() as u64,
            counts: SchemaCounts::from(&schema),
            script: progress.script,
            tasks: context.task_stats(),
            error: failure.as_ref().map(ToString::to_string),
            schema,
        };
        info!(
            graph = %summary.graph,
            success = summary.success,
            duration_ms = summary.duration_ms,
            "Schema load finished"
        );

        match failure {
            Some(err) if self.options.test_mode => Err(err),
            _ => Ok(summary),
        }
    }

    fn load(&self, context: &LoadContext, progress: &mut Progress) -> Result<(), LoadError> {
        context.ensure_open()?;
        context.set_loading_mode();

        if self.options.clear_all_data {
            self.clear_graph(context)?;
            progress.cleared = true;
        }

        match &self.options.schema {
            Some(path) => progress.script = Some(self.create_schema(context, path)?),
            None => info!(graph = %self.options.graph, "No schema script configured"),
        }

        context.ensure_open()?;
        context.set_stage(LoadStage::CacheRefresh);
        context.update_schema_cache()
    }

    fn clear_graph(&self, context: &LoadContext) -> Result<(), LoadError> {
        context.ensure_open()?;
        context.set_stage(LoadStage::Clearing);
        let graph = &self.options.graph;

        let _timeout = context.override_timeout(self.options.clear_timeout);
        let client = self.factory.create(&context.options())?;
        info!("Prepare to clear the data of graph '{}'", graph);
        let result = client.clear_graph(graph, CLEAR_CONFIRM_MESSAGE);
        client.close();
        result?;
        info!("The graph '{}' has been cleared successfully", graph);
        Ok(())
    }

    fn create_schema(&self, context: &LoadContext, path: &Path) -> Result<ExecutionReport, LoadError> {
        context.ensure_open()?;
        context.set_stage(LoadStage::SchemaCreating);
        let script = std::fs::read_to_string(path).map_err(|e| {
            LoadError::Config(format!(
                "Failed to read schema file '{}': {}",
                path.display(),
                e
            ))
        })?;
        info!(path = %path.display(), bytes = script.len(), "Loaded schema script");
        debug!(script = %script, "Schema script contents");

        let client = context.client()?;
        let mut runner = ScriptRunner::new();
        runner.bind(SCHEMA_BINDING, client.schema());
        runner.execute(&script, &client)
    }
}
