// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use ccb_worker::config::load_and_validate;
use ccb_worker::errors::WorkerError;
use ccb_worker::types::{ArgsMode, FailurePolicy, StackLimitMode};

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

const STORAGE: &str = r#"
[storage]
root = "/mnt/nfs"
control_files = "/opt/atlas/control"
data_files = "/opt/atlas/data"
"#;

#[test]
fn minimal_config_gets_defaults() {
    let file = config_file(STORAGE);
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.storage.root, PathBuf::from("/mnt/nfs"));
    assert_eq!(cfg.executor.step_timeout_secs, 1800);
    assert_eq!(cfg.executor.on_step_failure, FailurePolicy::Continue);
    assert_eq!(cfg.executor.args_mode, ArgsMode::Vector);
    assert_eq!(cfg.executor.stack_limit, StackLimitMode::Startup);
    assert_eq!(cfg.files.stage2_intermediate, "fort.8");
    assert_eq!(cfg.files.synthesis_legacy_input, "fort.95");
}

#[test]
fn executor_and_file_overrides_are_applied() {
    let file = config_file(&format!(
        r#"{STORAGE}
[files]
model_template = "atlas_in.tmpl"

[executor]
step_timeout_secs = 60
on_step_failure = "abort"
args_mode = "joined"
stack_limit = "every_job"
"#
    ));
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.files.model_template, "atlas_in.tmpl");
    assert_eq!(cfg.files.model_input, "t10000_400_72.mod.7011870916");
    assert_eq!(cfg.executor.step_timeout().as_secs(), 60);
    assert_eq!(cfg.executor.on_step_failure, FailurePolicy::Abort);
    assert_eq!(cfg.executor.args_mode, ArgsMode::Joined);
    assert_eq!(cfg.executor.stack_limit, StackLimitMode::EveryJob);
}

#[test]
fn zero_timeout_returns_config_error() {
    let file = config_file(&format!("{STORAGE}\n[executor]\nstep_timeout_secs = 0\n"));

    match load_and_validate(file.path()) {
        Err(WorkerError::ConfigError(msg)) => assert!(msg.contains("step_timeout_secs")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn file_names_must_be_bare() {
    let file = config_file(&format!("{STORAGE}\n[files]\nstage2_intermediate = \"../fort.8\"\n"));

    match load_and_validate(file.path()) {
        Err(WorkerError::ConfigError(msg)) => assert!(msg.contains("stage2_intermediate")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn shared_trees_may_share_the_storage_mount() {
    let file = config_file(
        r#"
[storage]
root = "/mnt/nfs"
control_files = "/mnt/nfs/atlas12/control"
data_files = "/mnt/nfs/atlas12/data"
"#,
    );

    let cfg = load_and_validate(file.path()).expect("config on one mount should load");
    assert_eq!(cfg.storage.control_files, PathBuf::from("/mnt/nfs/atlas12/control"));
    assert_eq!(cfg.storage.data_files, PathBuf::from("/mnt/nfs/atlas12/data"));
}

#[test]
fn unknown_policy_is_a_parse_error() {
    let file = config_file(&format!("{STORAGE}\n[executor]\non_step_failure = \"retry\"\n"));
    assert!(matches!(
        load_and_validate(file.path()),
        Err(WorkerError::TomlError(_))
    ));
}

#[test]
fn missing_storage_section_is_a_parse_error() {
    let file = config_file("[executor]\nstep_timeout_secs = 5\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(WorkerError::TomlError(_))
    ));
}
