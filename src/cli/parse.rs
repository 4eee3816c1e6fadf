//! CLI parse: clap types for the schema loader. No behavior; definitions only.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Provision the schema of a graph on a graph server
#[derive(Parser, Debug)]
#[command(name = "schema-loader")]
#[command(version)]
#[command(about = "Create graph schemas from a schema script, optionally clearing the graph first")]
pub struct Cli {
    /// Target graph name
    #[arg(short = 'g', long)]
    pub graph: Option<String>,

    /// Schema script to execute
    #[arg(short = 's', long)]
    pub schema: Option<PathBuf>,

    /// Graph server host
    #[arg(long)]
    pub host: Option<String>,

    /// Graph server port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Protocol used to reach the server (http, https)
    #[arg(long)]
    pub protocol: Option<String>,

    /// User for basic authentication
    #[arg(long)]
    pub username: Option<String>,

    /// Password for basic authentication
    #[arg(long)]
    pub password: Option<String>,

    /// Erase all data of the graph before creating the schema
    #[arg(long)]
    pub clear_all_data: bool,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Request timeout in seconds for clearing the graph
    #[arg(long)]
    pub clear_timeout: Option<u64>,

    /// Return load failures as errors instead of a failed status
    #[arg(long)]
    pub test_mode: bool,

    /// Run against an in-memory graph instead of the server
    #[arg(long)]
    pub dry_run: bool,

    /// Worker threads of the task manager
    #[arg(long)]
    pub task_threads: Option<usize>,

    /// Configuration file path (overrides ./schema-loader.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub print_config: bool,

    /// Summary output format
    #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
    pub summary_format: SummaryFormat,

    /// Debug level logging
    #[arg(long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Disable logging
    #[arg(long)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    Text,
    Json,
}
