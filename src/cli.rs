//! Command line arguments of the experiment runner.

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "sop_aco",
    version,
    about = "Solve sequential ordering problems with ant colony optimization.",
    long_about = None
)]
pub struct CliArgs {
    /// Glob patterns of experiment files (yaml, yml or ron).
    #[arg(required = true, value_name = "PATTERN")]
    pub experiments: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SOP_ACO_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Do not draw a progress bar.
    #[arg(long)]
    pub quiet: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
