// src/exec/runner.rs

//! Running one external command.
//!
//! The executor talks to a [`CommandRunner`] instead of spawning processes
//! itself, which keeps its state machine testable without real binaries.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};

/// How long to keep collecting output after a timed-out process was killed.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Fully resolved invocation of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub timeout: Duration,
}

/// What happened to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutput {
    /// The process exited (or was killed by a signal) on its own.
    Exited {
        success: bool,
        code: Option<i32>,
        output: String,
    },
    /// The timeout expired and the process was killed.
    TimedOut { output: String },
    /// The process never started, or waiting on it failed.
    SpawnFailed { error: String },
}

/// Trait abstracting how step commands are executed.
pub trait CommandRunner: Send + Sync {
    fn run(&self, cmd: StepCommand) -> Pin<Box<dyn Future<Output = RunOutput> + Send + '_>>;
}

/// Production runner built on `tokio::process`.
///
/// Stdout and stderr are read concurrently into one buffer, so the captured
/// text keeps the order in which the process wrote it (per read chunk).
#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner;

impl CommandRunner for TokioCommandRunner {
    fn run(&self, cmd: StepCommand) -> Pin<Box<dyn Future<Output = RunOutput> + Send + '_>> {
        Box::pin(run_command(cmd))
    }
}

async fn run_command(cmd: StepCommand) -> RunOutput {
    let mut command = Command::new(&cmd.program);
    command
        .args(&cmd.args)
        .current_dir(&cmd.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            return RunOutput::SpawnFailed {
                error: format!("spawning '{}': {err}", cmd.program),
            };
        }
    };

    let deadline = Instant::now() + cmd.timeout;
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let collector = {
        let buffer = Arc::clone(&buffer);
        tokio::spawn(async move {
            tokio::join!(drain(stdout, Arc::clone(&buffer)), drain(stderr, buffer));
        })
    };

    match timeout_at(deadline, child.wait()).await {
        Ok(Ok(status)) => {
            // Grandchildren may still hold the pipes open; never wait past
            // the step deadline for them.
            if timeout_at(deadline, collector).await.is_err() {
                warn!(program = %cmd.program, "output pipes still open after exit; truncating");
            }
            exited(status, take_output(&buffer))
        }
        Ok(Err(err)) => RunOutput::SpawnFailed {
            error: format!("waiting for '{}': {err}", cmd.program),
        },
        Err(_elapsed) => {
            debug!(program = %cmd.program, "step timed out; killing process");
            if let Err(err) = child.kill().await {
                warn!(program = %cmd.program, error = %err, "failed to kill timed-out process");
            }
            let _ = timeout(DRAIN_GRACE, collector).await;
            RunOutput::TimedOut {
                output: take_output(&buffer),
            }
        }
    }
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>, sink: Arc<Mutex<Vec<u8>>>) {
    let Some(mut reader) = reader else {
        return;
    };
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if let Ok(mut buf) = sink.lock() {
                    buf.extend_from_slice(&chunk[..n]);
                }
            }
        }
    }
}

fn take_output(buffer: &Mutex<Vec<u8>>) -> String {
    buffer
        .lock()
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}

fn exited(status: ExitStatus, output: String) -> RunOutput {
    RunOutput::Exited {
        success: status.success(),
        code: status.code(),
        output,
    }
}
