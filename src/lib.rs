//! Graph Schema Loader
//!
//! Provisions the schema of a graph on a graph server: optionally clears all graph
//! data, executes a schema script, refreshes the local schema cache and tears the run
//! down exactly once, whether the run completes, fails or is interrupted.

pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod loader;
pub mod logging;
pub mod script;
pub mod shutdown;
pub mod task;

pub use config::LoadOptions;
pub use error::LoadError;
pub use loader::{LoadSummary, SchemaLoader};
