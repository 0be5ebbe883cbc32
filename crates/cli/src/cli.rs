//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use observability::LogFormat;
use std::path::PathBuf;

/// Mesh Analyzer - service mesh telemetry analysis
#[derive(Parser, Debug)]
#[command(
    name = "mesh-analyzer",
    author,
    version,
    about = "Service mesh telemetry analysis",
    long_about = "Turns service mesh metric records into heartbeat, service, instance, \n\
                  endpoint and relation sources.\n\n\
                  Reads newline-delimited JSON metric records, applies endpoint naming \n\
                  rules, and forwards the resulting sources to configured receivers."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "MESH_ANALYZER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (json, pretty, compact)
    #[arg(
        long,
        default_value = "pretty",
        global = true,
        env = "MESH_ANALYZER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process metric records
    Process(ProcessArgs),

    /// Validate configuration file without processing
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `process` command
#[derive(Parser, Debug, Clone)]
pub struct ProcessArgs {
    /// Newline-delimited JSON metric records ("-" reads stdin)
    #[arg(short, long, default_value = "-", env = "MESH_ANALYZER_INPUT")]
    pub input: PathBuf,

    /// Path to configuration file (TOML or JSON); defaults to a single log receiver
    #[arg(short, long, env = "MESH_ANALYZER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Maximum number of records to process (0 = unlimited)
    #[arg(long, default_value = "0", env = "MESH_ANALYZER_MAX_RECORDS")]
    pub max_records: u64,

    /// Validate configuration and exit without processing
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "MESH_ANALYZER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "mesh-analyzer.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "mesh-analyzer.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show endpoint naming rules
    #[arg(long)]
    pub rules: bool,

    /// Show receiver configuration
    #[arg(long)]
    pub receivers: bool,
}
