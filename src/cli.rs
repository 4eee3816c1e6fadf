//! CLI domain: parse, option assembly, output and presentation only.
//! The run itself is driven by `SchemaLoader`.

mod output;
mod parse;
mod presentation;

pub use output::{exit_code, map_error, EXIT_FAILURE, EXIT_SUCCESS};
pub use parse::{Cli, SummaryFormat};
pub use presentation::{format_summary_json, format_summary_text};

use crate::config::{ConfigLoader, LoadOptions};
use crate::error::LoadError;
use std::path::Path;

/// Effective options: config file and environment from `dir`, then CLI flags.
pub fn load_options(cli: &Cli, dir: &Path) -> Result<LoadOptions, LoadError> {
    let mut options = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load(dir)?,
    };
    apply_overrides(&mut options, cli);
    Ok(options)
}

/// Apply CLI flags on top of loaded options (highest priority)
pub fn apply_overrides(options: &mut LoadOptions, cli: &Cli) {
    if let Some(graph) = &cli.graph {
        options.graph = graph.clone();
    }
    if let Some(schema) = &cli.schema {
        options.schema = Some(schema.clone());
    }
    if let Some(host) = &cli.host {
        options.host = host.clone();
    }
    if let Some(port) = cli.port {
        options.port = port;
    }
    if let Some(protocol) = &cli.protocol {
        options.protocol = protocol.clone();
    }
    if let Some(username) = &cli.username {
        options.username = Some(username.clone());
    }
    if let Some(password) = &cli.password {
        options.password = Some(password.clone());
    }
    if let Some(timeout) = cli.timeout {
        options.timeout = timeout;
    }
    if let Some(clear_timeout) = cli.clear_timeout {
        options.clear_timeout = clear_timeout;
    }
    if let Some(threads) = cli.task_threads {
        options.task_threads = threads;
    }
    // Boolean flags can only switch behavior on.
    options.clear_all_data |= cli.clear_all_data;
    options.test_mode |= cli.test_mode;
    options.dry_run |= cli.dry_run;

    let logging = &mut options.logging;
    if cli.quiet {
        logging.level = "off".to_string();
    } else if cli.verbose {
        logging.level = "debug".to_string();
    }
    if let Some(level) = &cli.log_level {
        logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        logging.format = format.clone();
    }
    if let Some(output) = &cli.log_output {
        logging.output = output.clone();
    }
    if let Some(file) = &cli.log_file {
        logging.file = Some(file.clone());
    }
}
