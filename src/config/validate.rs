// src/config/validate.rs

use std::path::Path;

use crate::config::model::{RawWorkerConfig, WorkerConfig};
use crate::errors::{Result, WorkerError};

impl TryFrom<RawWorkerConfig> for WorkerConfig {
    type Error = WorkerError;

    fn try_from(raw: RawWorkerConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(WorkerConfig::new_unchecked(raw.storage, raw.files, raw.executor))
    }
}

fn validate_raw_config(cfg: &RawWorkerConfig) -> Result<()> {
    validate_storage(cfg)?;
    validate_file_names(cfg)?;
    validate_executor(cfg)?;
    Ok(())
}

fn validate_storage(cfg: &RawWorkerConfig) -> Result<()> {
    let paths: [(&str, &Path); 3] = [
        ("root", cfg.storage.root.as_path()),
        ("control_files", cfg.storage.control_files.as_path()),
        ("data_files", cfg.storage.data_files.as_path()),
    ];
    for (key, path) in paths {
        if path.as_os_str().is_empty() {
            return Err(WorkerError::ConfigError(format!(
                "[storage].{key} must not be empty"
            )));
        }
    }
    Ok(())
}

fn validate_file_names(cfg: &RawWorkerConfig) -> Result<()> {
    for (key, name) in cfg.files.all() {
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return Err(WorkerError::ConfigError(format!(
                "[files].{key} must be a bare file name (got {name:?})"
            )));
        }
    }
    Ok(())
}

fn validate_executor(cfg: &RawWorkerConfig) -> Result<()> {
    if cfg.executor.step_timeout_secs == 0 {
        return Err(WorkerError::ConfigError(
            "[executor].step_timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.executor.queue_length == 0 {
        return Err(WorkerError::ConfigError(
            "[executor].queue_length must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
