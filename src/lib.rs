// src/lib.rs

pub mod calc;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod reformat;
pub mod template;
pub mod types;
pub mod workdir;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::calc::{Calculation, Execution, StepHook, StepResult};
use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, WorkerConfig};
use crate::exec::{spawn_executor, Executor, TokioCommandRunner};
use crate::fs::RealFileSystem;

/// Capacity of the result channel between executor and consumer.
const RESULT_CHANNEL_CAPACITY: usize = 64;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config and calculation loading
/// - the bounded work channel and the result channel
/// - the executor loop
/// - Ctrl-C handling
///
/// In a cluster deployment the dispatcher owns both channel ends; here the
/// calculation files stand in for it and results are logged.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut cfg = load_and_validate(&config_path)?;
    if let Some(policy) = args.on_step_failure {
        cfg.executor.on_step_failure = policy;
    }

    let calculations = args
        .calculations
        .iter()
        .map(Calculation::load)
        .collect::<crate::errors::Result<Vec<_>>>()?;

    if args.dry_run {
        print_dry_run(&cfg, &calculations);
        return Ok(());
    }
    if calculations.is_empty() {
        warn!("no calculations given; nothing to do");
    }

    let (work_tx, work_rx) = mpsc::channel::<Calculation>(cfg.executor.queue_length);
    let (result_tx, mut result_rx) = mpsc::channel::<StepResult>(RESULT_CHANNEL_CAPACITY);

    let executor = Executor::new(
        cfg,
        Arc::new(RealFileSystem),
        Arc::new(TokioCommandRunner),
        work_rx,
        result_tx,
    );
    let executor_handle = spawn_executor(executor);

    // Feed calculations in order; dropping `work_tx` afterwards lets the
    // executor loop finish.
    let feeder = tokio::spawn(async move {
        for calc in calculations {
            info!(calculation = %calc.name, steps = calc.steps.len(), "queueing calculation");
            if work_tx.send(calc).await.is_err() {
                break;
            }
        }
    });

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
        }
    };
    let Some(ResultTally { attempted, failed }) = collect_results(&mut result_rx, ctrl_c).await
    else {
        warn!("interrupted; stopping executor");
        feeder.abort();
        executor_handle.abort();
        return Err(anyhow!("interrupted"));
    };

    let _ = feeder.await;
    executor_handle.await??;

    info!(attempted, failed, "all calculations processed");
    if failed > 0 {
        return Err(anyhow!("{failed} of {attempted} attempted steps failed"));
    }
    Ok(())
}

/// Counts of step results seen by [`collect_results`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ResultTally {
    attempted: usize,
    failed: usize,
}

/// Log results until the executor drops its sender.
///
/// `shutdown` is polled across every iteration, so a signal that lands
/// while a result is being logged is still seen. Returns `None` if
/// `shutdown` completes first.
async fn collect_results<F>(
    result_rx: &mut mpsc::Receiver<StepResult>,
    shutdown: F,
) -> Option<ResultTally>
where
    F: std::future::Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut tally = ResultTally::default();
    loop {
        tokio::select! {
            received = result_rx.recv() => {
                let Some(result) = received else { return Some(tally) };
                tally.attempted += 1;
                if result.is_failed() {
                    tally.failed += 1;
                }
                log_result(&result);
            }
            () = &mut shutdown => return None,
        }
    }
}

fn log_result(result: &StepResult) {
    match result.error {
        None => info!(
            calculation = %result.calculation,
            step = result.step,
            status = %result.status,
            "step result"
        ),
        Some(ref err) => warn!(
            calculation = %result.calculation,
            step = result.step,
            status = %result.status,
            error = %err,
            "step result"
        ),
    }
}

/// Print the validated config and what each calculation would do.
fn print_dry_run(cfg: &WorkerConfig, calculations: &[Calculation]) {
    println!("ccb-worker dry-run");
    println!("  storage.root = {}", cfg.storage.root.display());
    println!("  storage.control_files = {}", cfg.storage.control_files.display());
    println!("  storage.data_files = {}", cfg.storage.data_files.display());
    println!("  executor.step_timeout_secs = {}", cfg.executor.step_timeout_secs);
    println!("  executor.on_step_failure = {:?}", cfg.executor.on_step_failure);
    println!("  executor.args_mode = {:?}", cfg.executor.args_mode);
    println!("  executor.stack_limit = {:?}", cfg.executor.stack_limit);
    println!();

    println!("calculations ({}):", calculations.len());
    for calc in calculations {
        println!(
            "  - {} (teff = {}, log_g = {}) -> {}",
            calc.name,
            calc.teff,
            calc.log_g,
            cfg.storage.root.join(&calc.name).display()
        );
        let execution = Execution::from_calculation(calc);
        for planned in &execution.steps {
            let state = if planned.should_skip() {
                format!("skip ({})", planned.step.status)
            } else {
                "run".to_string()
            };
            println!(
                "      [{}] {} {} {:?}",
                planned.index, state, planned.step.command, planned.step.args
            );
            match planned.hook {
                StepHook::None => {}
                StepHook::ModelInput => {
                    println!("          generates: {}", cfg.files.model_input)
                }
                StepHook::SynthesisInputs => println!(
                    "          generates: {}, {}, {}",
                    cfg.files.stage2_intermediate,
                    cfg.files.synthesis_input,
                    cfg.files.synthesis_legacy_input
                ),
            }
        }
    }
}
