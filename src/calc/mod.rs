// src/calc/mod.rs

//! Calculation data model.
//!
//! - [`Calculation`] / [`Step`]: the job as delivered by the dispatcher.
//! - [`execution`]: the executor-local view of one run (which steps are
//!   pending, which input files each step needs).
//! - [`result`]: one [`StepResult`] per attempted step, sent back to the
//!   dispatcher.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::errors::{Result, WorkerError};
use crate::types::StepStatus;

pub mod execution;
pub mod result;

pub use execution::{Execution, PlannedStep, StepHook};
pub use result::StepResult;

/// One parameterized run of the two-stage pipeline.
///
/// Calculation files look like:
///
/// ```toml
/// name = "t10000-g4.0"
/// teff = 10000.0
/// log_g = 4.0
///
/// [[steps]]
/// command = "atlas12_ada"
/// args = ["-i", "model.inp"]
///
/// [[steps]]
/// command = "atlas12_ada"
/// status = "Completed"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Calculation {
    /// Unique name; also the working-directory name under the storage root.
    pub name: String,

    /// Effective temperature.
    #[serde(alias = "Teff")]
    pub teff: f64,

    /// Surface gravity.
    #[serde(alias = "LogG")]
    pub log_g: f64,

    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One external-command invocation within a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Step {
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Outcome of a previous run, as persisted by the dispatcher.
    #[serde(default)]
    pub status: StepStatus,
}

impl Step {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            status: StepStatus::Unset,
        }
    }
}

impl Calculation {
    /// Reject calculations that cannot safely be mapped onto a directory or
    /// fed into the input templates.
    pub fn validate(&self) -> Result<()> {
        let name = self.name.as_str();
        if name.trim().is_empty() {
            return Err(WorkerError::InvalidCalculation(
                "calculation name must not be empty".to_string(),
            ));
        }
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(WorkerError::InvalidCalculation(format!(
                "calculation name '{name}' must be a single path component"
            )));
        }
        if !self.teff.is_finite() || !self.log_g.is_finite() {
            return Err(WorkerError::InvalidCalculation(format!(
                "calculation '{name}' has non-finite parameters (teff={}, log_g={})",
                self.teff, self.log_g
            )));
        }
        for (index, step) in self.steps.iter().enumerate() {
            if step.command.trim().is_empty() {
                return Err(WorkerError::InvalidCalculation(format!(
                    "calculation '{name}' step {index} has an empty command"
                )));
            }
        }
        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let calc: Calculation = toml::from_str(contents)?;
        calc.validate()?;
        Ok(calc)
    }

    /// Load and validate a calculation file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
