// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawWorkerConfig, WorkerConfig};
use crate::errors::Result;

/// Environment variable that overrides the default config location.
pub const CONFIG_ENV: &str = "CCB_WORKER_CONFIG";

/// Load a configuration file and return the raw, unvalidated config.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWorkerConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawWorkerConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// This is the entry point the rest of the worker uses.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WorkerConfig> {
    let raw_config = load_from_path(&path)?;
    let config = WorkerConfig::try_from(raw_config)?;
    Ok(config)
}

/// `$CCB_WORKER_CONFIG` if set, otherwise `ccb-worker.toml` in the current
/// working directory.
pub fn default_config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("ccb-worker.toml"))
}
