// src/errors.rs

//! Crate-wide error types.
//!
//! `WorkerError` covers everything that can stop the worker process itself
//! (bad config, unreadable calculation files, a failed startup action).
//! Per-job failures are modelled separately by [`JobError`] so the executor
//! can log them and move on to the next calculation.

use thiserror::Error;

use crate::reformat::ReformatError;
use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid calculation: {0}")]
    InvalidCalculation(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure that ends processing of one calculation.
///
/// Neither variant produces a `StepResult`; results already emitted for
/// earlier steps stay valid.
#[derive(Error, Debug)]
pub enum JobError {
    /// Stack limit, working directory or symlink walk failed before any step ran.
    #[error("setup failed: {0}")]
    Setup(#[source] anyhow::Error),

    /// An input file for a step could not be produced.
    #[error("input generation failed at step {step}: {source}")]
    Generation {
        step: usize,
        #[source]
        source: GenerationError,
    },

    /// Nobody is listening for results any more; the worker should stop.
    #[error("result channel closed")]
    Disconnected,
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Reformat(#[from] ReformatError),

    #[error("writing {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WorkerError>;
