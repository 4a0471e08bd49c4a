#![allow(dead_code)]

use std::path::Path;

use ccb_worker::calc::{Calculation, Step};
use ccb_worker::config::{ExecutorSection, FileNames, RawWorkerConfig, StorageSection, WorkerConfig};
use ccb_worker::types::{ArgsMode, FailurePolicy, StackLimitMode, StepStatus};

/// Builder for `Calculation` to simplify test setup.
pub struct CalculationBuilder {
    calc: Calculation,
}

impl CalculationBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            calc: Calculation {
                name: name.to_string(),
                teff: 10125.4,
                log_g: 4.25,
                steps: vec![],
            },
        }
    }

    pub fn params(mut self, teff: f64, log_g: f64) -> Self {
        self.calc.teff = teff;
        self.calc.log_g = log_g;
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.calc.steps.push(step);
        self
    }

    /// Append `n` steps running `command` with no arguments.
    pub fn steps(mut self, n: usize, command: &str) -> Self {
        for _ in 0..n {
            self.calc.steps.push(StepBuilder::new(command).build());
        }
        self
    }

    pub fn build(self) -> Calculation {
        self.calc
    }
}

/// Builder for `Step`.
pub struct StepBuilder {
    step: Step,
}

impl StepBuilder {
    pub fn new(command: &str) -> Self {
        Self {
            step: Step::new(command, vec![]),
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.step.args.push(arg.to_string());
        self
    }

    pub fn status(mut self, status: StepStatus) -> Self {
        self.step.status = status;
        self
    }

    pub fn build(self) -> Step {
        self.step
    }
}

/// Builder for a validated `WorkerConfig` rooted at arbitrary paths.
///
/// Stack-limit handling is disabled by default so tests never touch the
/// process rlimit.
pub struct WorkerConfigBuilder {
    raw: RawWorkerConfig,
}

impl WorkerConfigBuilder {
    pub fn new(root: &Path, control_files: &Path, data_files: &Path) -> Self {
        Self {
            raw: RawWorkerConfig {
                storage: StorageSection {
                    root: root.to_path_buf(),
                    control_files: control_files.to_path_buf(),
                    data_files: data_files.to_path_buf(),
                },
                files: FileNames::default(),
                executor: ExecutorSection {
                    stack_limit: StackLimitMode::Disabled,
                    ..ExecutorSection::default()
                },
            },
        }
    }

    pub fn step_timeout_secs(mut self, secs: u64) -> Self {
        self.raw.executor.step_timeout_secs = secs;
        self
    }

    pub fn on_step_failure(mut self, policy: FailurePolicy) -> Self {
        self.raw.executor.on_step_failure = policy;
        self
    }

    pub fn args_mode(mut self, mode: ArgsMode) -> Self {
        self.raw.executor.args_mode = mode;
        self
    }

    pub fn stack_limit(mut self, mode: StackLimitMode) -> Self {
        self.raw.executor.stack_limit = mode;
        self
    }

    pub fn files(mut self, files: FileNames) -> Self {
        self.raw.files = files;
        self
    }

    pub fn build(self) -> WorkerConfig {
        WorkerConfig::try_from(self.raw).expect("Failed to build valid config from builder")
    }
}
