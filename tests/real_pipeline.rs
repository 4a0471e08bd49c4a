// tests/real_pipeline.rs
//
// End-to-end runs against a temporary directory tree and real `sh`
// processes.

mod common;
use crate::common::builders::{CalculationBuilder, StepBuilder, WorkerConfigBuilder};
use crate::common::{init_tracing, with_timeout};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::mpsc;

use ccb_worker::calc::{Calculation, Step, StepResult};
use ccb_worker::config::WorkerConfig;
use ccb_worker::exec::{spawn_executor, Executor, TokioCommandRunner};
use ccb_worker::fs::RealFileSystem;
use ccb_worker::types::StepStatus;

struct Layout {
    _tmp: TempDir,
    root: PathBuf,
    control: PathBuf,
    data: PathBuf,
}

fn layout() -> Layout {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("nfs");
    let control = tmp.path().join("control");
    let data = tmp.path().join("data");
    fs::create_dir_all(&root).unwrap();
    fs::create_dir_all(control.join("odf")).unwrap();
    fs::create_dir_all(&data).unwrap();

    fs::write(
        control.join("kurucz_model.tmpl"),
        "TEFF {{.Teff}} GRAVITY {{.LogG}}\n",
    )
    .unwrap();
    fs::write(control.join("input_tlusty_fortfive.tmpl"), "{{.Teff}} {{.LogG}}\n").unwrap();
    fs::write(control.join("odf").join("p00big2.bdf"), "odf").unwrap();
    fs::write(data.join("molecules.dat"), "molecules").unwrap();

    Layout {
        _tmp: tmp,
        root,
        control,
        data,
    }
}

fn config(layout: &Layout) -> WorkerConfigBuilder {
    WorkerConfigBuilder::new(&layout.root, &layout.control, &layout.data)
}

fn sh(script: &str) -> Step {
    StepBuilder::new("sh").arg("-c").arg(script).build()
}

/// Spawn the executor loop, feed `calcs`, close the work channel and collect
/// every result until the executor exits.
async fn run_all(cfg: WorkerConfig, calcs: Vec<Calculation>) -> Vec<StepResult> {
    let (work_tx, work_rx) = mpsc::channel(4);
    let (result_tx, mut result_rx) = mpsc::channel(64);
    let executor = Executor::new(
        cfg,
        Arc::new(RealFileSystem),
        Arc::new(TokioCommandRunner),
        work_rx,
        result_tx,
    );
    let handle = spawn_executor(executor);

    for calc in calcs {
        work_tx.send(calc).await.unwrap();
    }
    drop(work_tx);

    let mut results = Vec::new();
    while let Some(r) = result_rx.recv().await {
        results.push(r);
    }
    handle.await.unwrap().unwrap();
    results
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn two_stage_pipeline_runs_end_to_end() {
    init_tracing();
    let layout = layout();

    let calc = CalculationBuilder::new("t10125-g425")
        .params(10125.4, 4.25)
        .step(sh("cat t10000_400_72.mod.7011870916"))
        .step(sh(
            "printf 'TEFF   9000.  GRAVITY 4.00000 LTE\\nREAD DECK6 72 RHOX\\n' > t10000_400_72_strat.mod",
        ))
        .step(sh("cat fort.8 fort.95"))
        .step(sh("echo oops >&2; exit 4"))
        .build();

    let results = with_timeout(run_all(config(&layout).build(), vec![calc])).await;

    let statuses: Vec<_> = results.iter().map(|r| (r.step, r.status)).collect();
    assert_eq!(
        statuses,
        vec![
            (0, StepStatus::Completed),
            (1, StepStatus::Completed),
            (2, StepStatus::Completed),
            (3, StepStatus::Failed),
        ]
    );
    assert_eq!(results[0].output, "TEFF 10125.4 GRAVITY 4.25\n");
    assert_eq!(
        results[2].output,
        "TEFF 9000. GRAVITY  4.00000   LTE\nREAD DECK6 64 RHOX\n10125.4000 4.2500\n"
    );
    assert!(results[3].output.contains("oops"));
    assert_eq!(results[3].error.as_deref(), Some("exit status 4"));

    let dir = layout.root.join("t10125-g425");
    assert_eq!(read(dir.join("input_tlusty_fortfive")), "10125.4000 4.2500\n");
    assert!(fs::symlink_metadata(dir.join("p00big2.bdf")).unwrap().file_type().is_symlink());
    assert!(fs::symlink_metadata(dir.join("molecules.dat")).unwrap().file_type().is_symlink());
    // Shared trees are never written to.
    assert_eq!(fs::read_dir(&layout.control).unwrap().count(), 3);
    assert_eq!(fs::read_dir(&layout.data).unwrap().count(), 1);
}

#[tokio::test]
async fn calculations_do_not_share_working_directories() {
    init_tracing();
    let layout = layout();

    let seeded = layout.root.join("iso-a");
    fs::create_dir_all(&seeded).unwrap();
    fs::write(seeded.join("marker-a"), "a").unwrap();

    let steps = |builder: CalculationBuilder| {
        builder
            .step(sh("basename \"$PWD\" > owner"))
            .step(sh("ls"))
            .build()
    };
    let calc_a = steps(CalculationBuilder::new("iso-a").params(9000.0, 3.5));
    let calc_b = steps(CalculationBuilder::new("iso-b").params(12000.0, 4.0));

    let results = with_timeout(run_all(config(&layout).build(), vec![calc_a, calc_b])).await;
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.status == StepStatus::Completed));

    let dir_a = layout.root.join("iso-a");
    let dir_b = layout.root.join("iso-b");
    assert_eq!(read(dir_a.join("owner")), "iso-a\n");
    assert_eq!(read(dir_b.join("owner")), "iso-b\n");
    assert!(dir_a.join("marker-a").exists());
    assert!(!dir_b.join("marker-a").exists());
    assert_eq!(
        read(dir_a.join("t10000_400_72.mod.7011870916")),
        "TEFF 9000.0 GRAVITY 3.50\n"
    );
    assert_eq!(
        read(dir_b.join("t10000_400_72.mod.7011870916")),
        "TEFF 12000.0 GRAVITY 4.00\n"
    );

    // Results keep calculation order, then step order.
    let order: Vec<_> = results
        .iter()
        .map(|r| (r.calculation.as_str(), r.step))
        .collect();
    assert_eq!(order, vec![("iso-a", 0), ("iso-a", 1), ("iso-b", 0), ("iso-b", 1)]);
}

#[tokio::test]
async fn step_exceeding_the_timeout_is_cancelled() {
    init_tracing();
    let layout = layout();

    let calc = CalculationBuilder::new("slow")
        .step(StepBuilder::new("sleep").arg("30").build())
        .build();
    let cfg = config(&layout).step_timeout_secs(1).build();

    let started = std::time::Instant::now();
    let results = with_timeout(run_all(cfg, vec![calc])).await;

    assert!(started.elapsed() < std::time::Duration::from_secs(10));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, StepStatus::Failed);
    assert!(results[0].error.as_deref().unwrap().contains("cancelled"));
}

#[tokio::test]
async fn rerun_reuses_directory_and_skips_finished_steps() {
    init_tracing();
    let layout = layout();

    let first = CalculationBuilder::new("resume")
        .step(sh("echo one >> log"))
        .step(sh("echo two >> log"))
        .build();
    let results = with_timeout(run_all(config(&layout).build(), vec![first.clone()])).await;
    assert_eq!(results.len(), 2);

    // The dispatcher persisted step 0; step 1 is attempted again.
    let mut resumed = first;
    resumed.steps[0].status = StepStatus::Completed;
    let results = with_timeout(run_all(config(&layout).build(), vec![resumed])).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].step, 1);
    assert_eq!(read(layout.root.join("resume").join("log")), "one\ntwo\ntwo\n");
}
