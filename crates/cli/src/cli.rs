//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// bulkmt - groups commands into bulks and fans them out to sinks
#[derive(Parser, Debug)]
#[command(
    name = "bulkmt",
    author,
    version,
    about = "Command batcher with asynchronous sink fan-out",
    long_about = "Reads whitespace-separated commands from stdin and groups them into bulks.\n\n\
                  A bulk closes after BLOCK_SIZE commands, or at `{` / `}` boundaries of a \n\
                  dynamic block. Each bulk is written to stdout and to timestamped log files."
)]
pub struct Cli {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "BULKMT_VERBOSE")]
    pub verbose: u8,

    /// Suppress all logging except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (logs go to stderr)
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "BULKMT_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read commands from stdin and emit bulks
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Commands per bulk outside dynamic blocks (overrides the config file)
    #[arg(env = "BULKMT_BLOCK_SIZE")]
    pub block_size: Option<usize>,

    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "BULKMT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for bulk log files (overrides the config file)
    #[arg(short, long, env = "BULKMT_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "BULKMT_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "bulkmt.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
