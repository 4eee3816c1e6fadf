//! Config sources: optional TOML file, then `SCHEMA_LOADER__*` environment variables.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::{Environment, File, FileFormat};
use std::path::Path;
use tracing::debug;

/// Add the config file to the builder when one was resolved.
pub fn add_file(
    builder: ConfigBuilder<DefaultState>,
    file: Option<&Path>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let Some(path) = file else {
        return Ok(builder);
    };
    debug!(config_path = %path.display(), "Loading configuration file");
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    Ok(builder.add_source(File::from(canonical).format(FileFormat::Toml).required(true)))
}

/// Environment overrides, e.g. `SCHEMA_LOADER__GRAPH=g1` or `SCHEMA_LOADER__LOGGING__LEVEL=debug`.
pub fn add_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("SCHEMA_LOADER")
            .separator("__")
            .try_parsing(true),
    )
}
