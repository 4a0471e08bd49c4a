// src/exec/mod.rs

//! Step pipeline execution.
//!
//! - [`executor`] owns the work loop: one calculation at a time, one step at
//!   a time, one `StepResult` per attempted step.
//! - [`runner`] provides the [`CommandRunner`] trait and the production
//!   [`TokioCommandRunner`]; tests plug in a scripted runner instead.
//! - [`limits`] raises the process-wide stack rlimit the legacy tools need.

pub mod executor;
pub mod limits;
pub mod runner;

pub use executor::{spawn_executor, Executor, JobSummary};
pub use runner::{CommandRunner, RunOutput, StepCommand, TokioCommandRunner};
