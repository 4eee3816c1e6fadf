//! Error types for the schema loader.

use thiserror::Error;

/// Errors raised while provisioning a graph schema.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Remote service error: {0}")]
    RemoteService(String),

    #[error("Script error at line {line}: {message}")]
    ScriptExecution { line: usize, message: String },

    #[error("Teardown error: {0}")]
    Teardown(String),

    #[error("Task rejected: {0}")]
    TaskRejected(String),

    #[error("Task aborted: {0}")]
    TaskAborted(String),

    #[error("Context closed: {0}")]
    ContextClosed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Single reportable failure of a run; the original error stays reachable via `source()`.
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        cause: Box<LoadError>,
    },
}

impl LoadError {
    /// Wrap into `Failed` with a human readable message. Already normalized errors pass through.
    pub fn normalize(self, message: impl Into<String>) -> LoadError {
        match self {
            failed @ LoadError::Failed { .. } => failed,
            other => LoadError::Failed {
                message: format!("{}: {}", message.into(), other),
                cause: Box::new(other),
            },
        }
    }

    /// Innermost error behind any normalization.
    pub fn root_cause(&self) -> &LoadError {
        match self {
            LoadError::Failed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    pub fn script(line: usize, message: impl Into<String>) -> LoadError {
        LoadError::ScriptExecution {
            line,
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for LoadError {
    fn from(err: config::ConfigError) -> Self {
        LoadError::Config(err.to_string())
    }
}
