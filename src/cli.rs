// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::FailurePolicy;

/// Command-line arguments for `ccb-worker`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ccb-worker",
    version,
    about = "Run atmosphere-model / spectral-synthesis calculations step by step.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the worker config file (TOML).
    ///
    /// Default: `$CCB_WORKER_CONFIG`, else `ccb-worker.toml` in the current
    /// working directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Calculation file (TOML) to execute. May be given several times; the
    /// calculations run one after another in the given order.
    #[arg(long = "calculation", value_name = "PATH")]
    pub calculations: Vec<PathBuf>,

    /// Override `[executor].on_step_failure` ("continue" or "abort").
    #[arg(long, value_name = "POLICY")]
    pub on_step_failure: Option<FailurePolicy>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CCB_WORKER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate config and calculations, print the step plan, run nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
