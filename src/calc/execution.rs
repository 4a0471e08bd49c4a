// src/calc/execution.rs

//! Executor-local plan for one run of a calculation.
//!
//! This is pure data: no IO, no channels. The executor walks
//! [`Execution::pending`] and performs the [`StepHook`] of each step right
//! before launching its command.

use crate::calc::{Calculation, Step};

/// Index of the step that consumes the generated stage-1 model input.
pub const MODEL_INPUT_STEP: usize = 0;

/// Index of the step that consumes the reformatted stage-2 inputs.
pub const SYNTHESIS_INPUTS_STEP: usize = 2;

/// Input files that must be produced right before a step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepHook {
    None,
    /// Render the stage-1 model-input template.
    ModelInput,
    /// Reformat the stage-1 output into the stage-2 intermediate file and
    /// render the stage-2 runtime input.
    SynthesisInputs,
}

impl StepHook {
    pub fn for_index(index: usize) -> Self {
        match index {
            MODEL_INPUT_STEP => StepHook::ModelInput,
            SYNTHESIS_INPUTS_STEP => StepHook::SynthesisInputs,
            _ => StepHook::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStep {
    pub index: usize,
    pub step: Step,
    pub hook: StepHook,
}

impl PlannedStep {
    /// A step with a persisted status has been handled by an earlier run.
    pub fn should_skip(&self) -> bool {
        self.step.status.is_set()
    }
}

/// Grouping of a calculation's name and steps for the duration of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub calculation: String,
    pub steps: Vec<PlannedStep>,
}

impl Execution {
    pub fn from_calculation(calc: &Calculation) -> Self {
        let steps = calc
            .steps
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, step)| PlannedStep {
                index,
                step,
                hook: StepHook::for_index(index),
            })
            .collect();

        Self {
            calculation: calc.name.clone(),
            steps,
        }
    }

    /// Steps that still need to run, in declared order.
    pub fn pending(&self) -> impl Iterator<Item = &PlannedStep> {
        self.steps.iter().filter(|s| !s.should_skip())
    }

    pub fn skipped_count(&self) -> usize {
        self.steps.iter().filter(|s| s.should_skip()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StepStatus;

    fn calc_with_statuses(statuses: &[StepStatus]) -> Calculation {
        Calculation {
            name: "calc".to_string(),
            teff: 10000.0,
            log_g: 4.0,
            steps: statuses
                .iter()
                .enumerate()
                .map(|(i, status)| Step {
                    command: format!("cmd{i}"),
                    args: vec![],
                    status: *status,
                })
                .collect(),
        }
    }

    #[test]
    fn hooks_are_bound_to_step_positions() {
        let exec = Execution::from_calculation(&calc_with_statuses(&[StepStatus::Unset; 4]));
        let hooks: Vec<_> = exec.steps.iter().map(|s| s.hook).collect();
        assert_eq!(
            hooks,
            vec![
                StepHook::ModelInput,
                StepHook::None,
                StepHook::SynthesisInputs,
                StepHook::None
            ]
        );
    }

    #[test]
    fn pending_skips_steps_with_persisted_status() {
        let exec = Execution::from_calculation(&calc_with_statuses(&[
            StepStatus::Completed,
            StepStatus::Failed,
            StepStatus::Unset,
            StepStatus::Unset,
        ]));
        let pending: Vec<_> = exec.pending().map(|s| s.index).collect();
        assert_eq!(pending, vec![2, 3]);
        assert_eq!(exec.skipped_count(), 2);
    }
}
