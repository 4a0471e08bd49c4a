use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use ccb_worker::exec::{CommandRunner, RunOutput, StepCommand};

/// A fake runner that:
/// - records every `StepCommand` it receives
/// - replays scripted outputs in order, falling back to a successful exit
///   once the script is exhausted.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    calls: Arc<Mutex<Vec<StepCommand>>>,
    script: Arc<Mutex<VecDeque<RunOutput>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, output: RunOutput) -> Self {
        self.script.lock().unwrap().push_back(output);
        self
    }

    pub fn then_success(self, output: &str) -> Self {
        self.then(RunOutput::Exited {
            success: true,
            code: Some(0),
            output: output.to_string(),
        })
    }

    pub fn then_exit(self, code: i32, output: &str) -> Self {
        self.then(RunOutput::Exited {
            success: code == 0,
            code: Some(code),
            output: output.to_string(),
        })
    }

    pub fn then_timeout(self) -> Self {
        self.then(RunOutput::TimedOut {
            output: String::new(),
        })
    }

    pub fn calls(&self) -> Vec<StepCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, cmd: StepCommand) -> Pin<Box<dyn Future<Output = RunOutput> + Send + '_>> {
        self.calls.lock().unwrap().push(cmd);
        let next = self.script.lock().unwrap().pop_front();

        Box::pin(async move {
            next.unwrap_or(RunOutput::Exited {
                success: true,
                code: Some(0),
                output: String::new(),
            })
        })
    }
}
