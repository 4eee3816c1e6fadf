//! Configuration System
//!
//! Run options for a schema load. Values are layered from built-in defaults, an optional
//! TOML file, `SCHEMA_LOADER__*` environment variables and finally CLI flags.

use crate::error::LoadError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod merge;
mod sources;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "schema-loader.toml";

/// Options for one schema provisioning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Target graph name on the server
    pub graph: String,

    /// `http` or `https`
    pub protocol: String,

    pub host: String,

    pub port: u16,

    /// Optional basic-auth user
    pub username: Option<String>,

    pub password: Option<String>,

    /// Schema script to execute; when unset only the schema cache is refreshed
    pub schema: Option<PathBuf>,

    /// Erase all graph data before creating the schema
    pub clear_all_data: bool,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Request timeout in seconds used for the destructive clear only
    pub clear_timeout: u64,

    /// Re-raise run failures to the caller after teardown
    pub test_mode: bool,

    /// Execute against an in-memory graph instead of the server
    pub dry_run: bool,

    /// Worker threads (and concurrent task permits) of the task manager
    pub task_threads: usize,

    /// Seconds to wait for worker threads when shutting the task manager down
    pub shutdown_timeout: u64,

    pub logging: LoggingConfig,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            graph: "hugegraph".to_string(),
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 8080,
            username: None,
            password: None,
            schema: None,
            clear_all_data: false,
            timeout: 60,
            clear_timeout: 240,
            test_mode: false,
            dry_run: false,
            task_threads: 4,
            shutdown_timeout: 10,
            logging: LoggingConfig::default(),
        }
    }
}

impl LoadOptions {
    /// Validate option values before a run starts
    pub fn validate(&self) -> Result<(), LoadError> {
        let mut errors = Vec::new();

        if self.graph.trim().is_empty() {
            errors.push("graph name cannot be empty".to_string());
        }
        if self.protocol != "http" && self.protocol != "https" {
            errors.push(format!(
                "protocol must be 'http' or 'https', got '{}'",
                self.protocol
            ));
        }
        if self.host.trim().is_empty() {
            errors.push("host cannot be empty".to_string());
        }
        if self.port == 0 {
            errors.push("port must be greater than 0".to_string());
        }
        if self.timeout == 0 {
            errors.push("timeout must be greater than 0".to_string());
        }
        if self.clear_timeout == 0 {
            errors.push("clear_timeout must be greater than 0".to_string());
        }
        if self.task_threads == 0 {
            errors.push("task_threads must be greater than 0".to_string());
        }
        if self.username.is_some() != self.password.is_some() {
            errors.push("username and password must be given together".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(LoadError::Config(errors.join("; ")))
        }
    }

    /// Base URL of the graph server, e.g. `http://localhost:8080`
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, LoadError> {
        let mut shown = self.clone();
        if shown.password.is_some() {
            shown.password = Some("******".to_string());
        }
        toml::to_string_pretty(&shown)
            .map_err(|e| LoadError::Config(format!("Failed to render configuration: {}", e)))
    }
}

/// Loads `LoadOptions` from defaults, files and environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load using `schema-loader.toml` in `dir` when present.
    pub fn load(dir: &Path) -> Result<LoadOptions, LoadError> {
        let default_file = dir.join(DEFAULT_CONFIG_FILE);
        let file = default_file.exists().then_some(default_file);
        Self::build(file.as_deref())
    }

    /// Load with an explicit config file, which must exist.
    pub fn load_from_file(path: &Path) -> Result<LoadOptions, LoadError> {
        if !path.exists() {
            return Err(LoadError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        Self::build(Some(path))
    }

    fn build(file: Option<&Path>) -> Result<LoadOptions, LoadError> {
        let builder = merge::builder_with_defaults()?;
        let builder = sources::add_file(builder, file)?;
        let builder = sources::add_environment(builder);
        let options: LoadOptions = builder.build()?.try_deserialize()?;
        Ok(options)
    }
}
