// src/types.rs

//! Small closed enums shared across modules.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Status of a step, both as persisted by the dispatcher and as reported in
/// a `StepResult`.
///
/// `Unset` means the step has never finished; anything else marks the step
/// as already handled and it is skipped on a resumed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum StepStatus {
    #[default]
    Unset,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn is_set(self) -> bool {
        !matches!(self, StepStatus::Unset)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Unset => "",
            StepStatus::Completed => "Completed",
            StepStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Unset => f.write_str("unset"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "unset" => Ok(StepStatus::Unset),
            "completed" => Ok(StepStatus::Completed),
            "failed" => Ok(StepStatus::Failed),
            other => Err(format!(
                "invalid step status: {other} (expected \"Completed\", \"Failed\" or empty)"
            )),
        }
    }
}

impl TryFrom<String> for StepStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// What the executor does with the remaining steps of a job after one fails.
///
/// - `Continue`: keep going and attempt every remaining step (historical
///   behaviour, and the default).
/// - `Abort`: stop the job right after the failed step's result is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Continue,
    Abort,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "continue" => Ok(FailurePolicy::Continue),
            "abort" => Ok(FailurePolicy::Abort),
            other => Err(format!(
                "invalid on_step_failure: {other} (expected \"continue\" or \"abort\")"
            )),
        }
    }
}

/// How a step's argument list reaches the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgsMode {
    /// One process argument per list entry.
    #[default]
    Vector,
    /// All entries joined with single spaces into one process argument.
    /// Only for step definitions written against the old worker.
    Joined,
}

/// When the process-wide stack rlimit is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackLimitMode {
    /// Once, before the first calculation is accepted.
    #[default]
    Startup,
    /// Before every calculation; a failure is a setup error for that job.
    EveryJob,
    Disabled,
}
