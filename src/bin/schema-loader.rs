//! Schema Loader CLI Binary
//!
//! Command-line interface for provisioning graph schemas.

use anyhow::Context;
use clap::Parser;
use graph_schema_loader::cli::{
    exit_code, format_summary_json, format_summary_text, load_options, map_error, Cli,
    SummaryFormat, EXIT_FAILURE, EXIT_SUCCESS,
};
use graph_schema_loader::logging::init_logging;
use graph_schema_loader::{LoadOptions, SchemaLoader};
use std::io::IsTerminal;
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let options = match prepare(&cli) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(EXIT_FAILURE);
        }
    };

    if cli.print_config {
        match options.to_toml() {
            Ok(rendered) => {
                print!("{}", rendered);
                process::exit(EXIT_SUCCESS);
            }
            Err(e) => {
                eprintln!("{}", map_error(&e));
                process::exit(EXIT_FAILURE);
            }
        }
    }

    // Initialize logging before the run
    if let Err(e) = init_logging(Some(&options.logging)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(EXIT_FAILURE);
    }

    info!(graph = %options.graph, dry_run = options.dry_run, "Schema loader starting");

    let loader = SchemaLoader::new(options);
    match loader.execute() {
        Ok(summary) => {
            let rendered = match cli.summary_format {
                SummaryFormat::Json => format_summary_json(&summary),
                SummaryFormat::Text => Ok(format_summary_text(
                    &summary,
                    std::io::stdout().is_terminal(),
                )),
            };
            match rendered {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("{}", map_error(&e)),
            }
            process::exit(exit_code(summary.success));
        }
        Err(e) => {
            error!("Schema load failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(EXIT_FAILURE);
        }
    }
}

/// Resolve and validate options from config file, environment and flags
fn prepare(cli: &Cli) -> anyhow::Result<LoadOptions> {
    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let options = load_options(cli, &cwd).context("Failed to load configuration")?;
    options.validate().context("Invalid configuration")?;
    Ok(options)
}
