//! Merge rules: built-in defaults form the lowest layer.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with the loader defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("graph", "hugegraph")?
        .set_default("protocol", "http")?
        .set_default("host", "localhost")?
        .set_default("port", 8080)?
        .set_default("timeout", 60)?
        .set_default("clear_timeout", 240)?
        .set_default("task_threads", 4)?
        .set_default("shutdown_timeout", 10)
}
