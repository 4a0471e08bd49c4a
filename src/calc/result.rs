// src/calc/result.rs

use std::time::Duration;

use crate::types::StepStatus;

/// Outcome of one attempted step, consumed by the dispatcher to update the
/// persisted step status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub calculation: String,
    pub step: usize,
    /// Always `Completed` or `Failed`.
    pub status: StepStatus,
    /// Combined stdout/stderr of the command.
    pub output: String,
    pub error: Option<String>,
}

impl StepResult {
    pub fn completed(calculation: &str, step: usize, output: String) -> Self {
        Self {
            calculation: calculation.to_string(),
            step,
            status: StepStatus::Completed,
            output,
            error: None,
        }
    }

    pub fn failed(calculation: &str, step: usize, output: String, error: String) -> Self {
        Self {
            calculation: calculation.to_string(),
            step,
            status: StepStatus::Failed,
            output,
            error: Some(error),
        }
    }

    pub fn timed_out(calculation: &str, step: usize, output: String, timeout: Duration) -> Self {
        let error = format!(
            "timed out after {}s; process cancelled",
            timeout.as_secs_f64()
        );
        Self::failed(calculation, step, output, error)
    }

    pub fn is_failed(&self) -> bool {
        self.status == StepStatus::Failed
    }
}
