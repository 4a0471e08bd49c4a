// src/logging.rs

//! Logging setup for `ccb-worker` using `tracing` + `tracing-subscriber`.
//!
//! The filter is chosen in this order:
//! 1. `--log-level` CLI flag, applied to this crate only
//! 2. `CCB_WORKER_LOG`, either a bare level ("debug") for this crate or a
//!    full `EnvFilter` directive list ("ccb_worker::exec=trace,warn")
//! 3. [`DEFAULT_DIRECTIVES`]
//!
//! Dependencies stay at `warn` unless a directive list says otherwise.
//! Logs go to STDERR.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "CCB_WORKER_LOG";

pub const DEFAULT_DIRECTIVES: &str = "warn,ccb_worker=info";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = EnvFilter::try_new(filter_directives(cli_level, env.as_deref()))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))?;

    Ok(())
}

fn filter_directives(cli_level: Option<LogLevel>, env: Option<&str>) -> String {
    if let Some(lvl) = cli_level {
        return crate_directives(level_name(lvl));
    }
    match env.map(str::trim) {
        None | Some("") => DEFAULT_DIRECTIVES.to_string(),
        Some(spec) => match parse_level_str(spec) {
            Some(level) => crate_directives(level),
            None => spec.to_string(),
        },
    }
}

fn crate_directives(level: &str) -> String {
    format!("warn,ccb_worker={level}")
}

fn level_name(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

fn parse_level_str(s: &str) -> Option<&'static str> {
    match s.to_lowercase().as_str() {
        "error" => Some("error"),
        "warn" | "warning" => Some("warn"),
        "info" => Some("info"),
        "debug" => Some("debug"),
        "trace" => Some("trace"),
        _ => None,
    }
}
