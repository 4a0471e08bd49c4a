// src/exec/executor.rs

//! The step pipeline executor.
//!
//! Per calculation:
//!
//! 1. (optionally) raise the stack limit,
//! 2. ensure `<root>/<name>` exists,
//! 3. link the shared control/data trees into it,
//! 4. walk the pending steps in order, producing the input files a step
//!    needs right before running it, and emit one [`StepResult`] per step.
//!
//! Setup and input-generation failures end the calculation without further
//! results. A failing command never does: it becomes a `Failed` result and,
//! under [`FailurePolicy::Continue`], the next step still runs.

use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::calc::{Calculation, Execution, PlannedStep, StepHook, StepResult};
use crate::config::WorkerConfig;
use crate::errors::{GenerationError, JobError, Result, WorkerError};
use crate::exec::limits::raise_stack_limit;
use crate::exec::runner::{CommandRunner, RunOutput, StepCommand};
use crate::fs::FileSystem;
use crate::reformat::reformat_stage2_input;
use crate::template::{model_input_vars, render_file, synthesis_input_vars};
use crate::types::{ArgsMode, FailurePolicy, StackLimitMode};
use crate::workdir;

/// Function used to lift the stack limit; replaceable in tests.
pub type StackLimiter = fn() -> anyhow::Result<()>;

/// Per-calculation tally, logged when a calculation finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobSummary {
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// True if the run stopped early under [`FailurePolicy::Abort`].
    pub aborted: bool,
}

pub struct Executor {
    config: WorkerConfig,
    fs: Arc<dyn FileSystem>,
    runner: Arc<dyn CommandRunner>,
    work_rx: mpsc::Receiver<Calculation>,
    result_tx: mpsc::Sender<StepResult>,
    stack_limiter: StackLimiter,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .field("fs", &self.fs)
            .finish_non_exhaustive()
    }
}

impl Executor {
    pub fn new(
        config: WorkerConfig,
        fs: Arc<dyn FileSystem>,
        runner: Arc<dyn CommandRunner>,
        work_rx: mpsc::Receiver<Calculation>,
        result_tx: mpsc::Sender<StepResult>,
    ) -> Self {
        Self {
            config,
            fs,
            runner,
            work_rx,
            result_tx,
            stack_limiter: raise_stack_limit,
        }
    }

    pub fn with_stack_limiter(mut self, limiter: StackLimiter) -> Self {
        self.stack_limiter = limiter;
        self
    }

    /// Work loop: one calculation at a time until the work channel closes.
    ///
    /// Only a startup failure (stack limit in [`StackLimitMode::Startup`])
    /// is returned as an error; per-calculation failures are logged.
    pub async fn run(mut self) -> Result<()> {
        if self.config.executor.stack_limit == StackLimitMode::Startup {
            (self.stack_limiter)().map_err(WorkerError::Other)?;
        }
        info!("executor loop started");

        while let Some(calc) = self.work_rx.recv().await {
            let name = calc.name.clone();
            match self.process(calc).await {
                Ok(summary) => info!(
                    calculation = %name,
                    completed = summary.completed,
                    failed = summary.failed,
                    skipped = summary.skipped,
                    aborted = summary.aborted,
                    "calculation finished"
                ),
                Err(JobError::Disconnected) => {
                    warn!(calculation = %name, "result channel closed; stopping executor");
                    break;
                }
                Err(err) => error!(calculation = %name, error = %err, "calculation aborted"),
            }
        }

        info!("executor loop finished (channel closed)");
        Ok(())
    }

    /// Run one calculation to the end of its step list.
    pub async fn process(&self, calc: Calculation) -> std::result::Result<JobSummary, JobError> {
        let dir = self.setup(&calc)?;
        let execution = Execution::from_calculation(&calc);

        let mut summary = JobSummary {
            skipped: execution.skipped_count(),
            ..JobSummary::default()
        };

        for planned in execution.pending() {
            self.prepare_inputs(&calc, &dir, planned)
                .map_err(|source| JobError::Generation {
                    step: planned.index,
                    source,
                })?;

            let result = self.run_step(&execution.calculation, &dir, planned).await;
            let failed = result.is_failed();
            if failed {
                summary.failed += 1;
            } else {
                summary.completed += 1;
            }

            self.result_tx
                .send(result)
                .await
                .map_err(|_| JobError::Disconnected)?;

            if failed && self.config.executor.on_step_failure == FailurePolicy::Abort {
                info!(
                    calculation = %calc.name,
                    step = planned.index,
                    "step failed; skipping remaining steps"
                );
                summary.aborted = true;
                break;
            }
        }

        Ok(summary)
    }

    fn setup(&self, calc: &Calculation) -> std::result::Result<std::path::PathBuf, JobError> {
        calc.validate()
            .map_err(|e| JobError::Setup(anyhow!(e)))?;

        if self.config.executor.stack_limit == StackLimitMode::EveryJob {
            (self.stack_limiter)().map_err(JobError::Setup)?;
        }

        let storage = &self.config.storage;
        let fs = self.fs.as_ref();
        let dir = workdir::ensure_dir(fs, &storage.root, &calc.name).map_err(JobError::Setup)?;

        workdir::link_tree(
            fs,
            &[storage.control_files.as_path(), storage.data_files.as_path()],
            &dir,
        )
        .map_err(JobError::Setup)?;

        Ok(dir)
    }

    /// Produce the input files `planned` reads.
    fn prepare_inputs(
        &self,
        calc: &Calculation,
        dir: &Path,
        planned: &PlannedStep,
    ) -> std::result::Result<(), GenerationError> {
        let files = &self.config.files;
        let fs = self.fs.as_ref();

        match planned.hook {
            StepHook::None => Ok(()),
            StepHook::ModelInput => render_file(
                fs,
                &dir.join(&files.model_template),
                &[dir.join(&files.model_input).as_path()],
                &model_input_vars(calc.teff, calc.log_g),
            ),
            StepHook::SynthesisInputs => {
                info!(calculation = %calc.name, "generating synthesis input files");
                let contents = reformat_stage2_input(fs, dir, &files.stage1_output_prefix)?;
                let intermediate = dir.join(&files.stage2_intermediate);
                fs.write(&intermediate, &contents)
                    .map_err(|source| GenerationError::Write {
                        path: intermediate.display().to_string(),
                        source,
                    })?;

                render_file(
                    fs,
                    &dir.join(&files.synthesis_template),
                    &[
                        dir.join(&files.synthesis_input).as_path(),
                        dir.join(&files.synthesis_legacy_input).as_path(),
                    ],
                    &synthesis_input_vars(calc.teff, calc.log_g),
                )
            }
        }
    }

    async fn run_step(&self, calculation: &str, dir: &Path, planned: &PlannedStep) -> StepResult {
        let command = self.step_command(dir, planned);
        let timeout = command.timeout;

        info!(
            calculation,
            step = planned.index,
            command = %command.program,
            args = ?command.args,
            "running command and waiting for it to finish"
        );

        let result = match self.runner.run(command).await {
            RunOutput::Exited {
                success: true,
                output,
                ..
            } => StepResult::completed(calculation, planned.index, output),
            RunOutput::Exited { code, output, .. } => {
                let error = match code {
                    Some(code) => format!("exit status {code}"),
                    None => "terminated by signal".to_string(),
                };
                StepResult::failed(calculation, planned.index, output, error)
            }
            RunOutput::TimedOut { output } => {
                StepResult::timed_out(calculation, planned.index, output, timeout)
            }
            RunOutput::SpawnFailed { error } => {
                StepResult::failed(calculation, planned.index, String::new(), error)
            }
        };

        if let Some(ref error) = result.error {
            error!(
                calculation,
                step = planned.index,
                error = %error,
                output = %result.output,
                "command failed"
            );
        }
        info!(
            calculation,
            step = planned.index,
            status = %result.status,
            "command finished"
        );

        result
    }

    fn step_command(&self, dir: &Path, planned: &PlannedStep) -> StepCommand {
        let args = match self.config.executor.args_mode {
            ArgsMode::Vector => planned.step.args.clone(),
            // Legacy step definitions expect exactly one (possibly empty)
            // argument holding the whole argument string.
            ArgsMode::Joined => vec![planned.step.args.join(" ")],
        };

        StepCommand {
            program: planned.step.command.clone(),
            args,
            cwd: dir.to_path_buf(),
            timeout: self.config.executor.step_timeout(),
        }
    }
}

/// Spawn the executor loop on the Tokio runtime.
pub fn spawn_executor(executor: Executor) -> JoinHandle<Result<()>> {
    tokio::spawn(executor.run())
}
