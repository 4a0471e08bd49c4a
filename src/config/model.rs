// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{ArgsMode, FailurePolicy, StackLimitMode};

/// Configuration as read from TOML, before validation.
///
/// ```toml
/// [storage]
/// root = "/mnt/nfs"
/// control_files = "/opt/atlas/control"
/// data_files = "/opt/atlas/data"
///
/// [files]
/// model_template = "kurucz_model.tmpl"
///
/// [executor]
/// step_timeout_secs = 1800
/// on_step_failure = "continue"
/// ```
///
/// `[files]` and `[executor]` are optional and fully defaulted.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWorkerConfig {
    pub storage: StorageSection,

    #[serde(default)]
    pub files: FileNames,

    #[serde(default)]
    pub executor: ExecutorSection,
}

/// Validated worker configuration. Build it with `WorkerConfig::try_from`.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub storage: StorageSection,
    pub files: FileNames,
    pub executor: ExecutorSection,
}

impl WorkerConfig {
    pub(crate) fn new_unchecked(
        storage: StorageSection,
        files: FileNames,
        executor: ExecutorSection,
    ) -> Self {
        Self {
            storage,
            files,
            executor,
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    /// Shared storage root; one working directory per calculation lives here.
    pub root: PathBuf,

    /// Read-only tree of control files (templates, opacity tables, ...).
    pub control_files: PathBuf,

    /// Read-only tree of data files.
    pub data_files: PathBuf,
}

/// `[files]` section: fixed file names inside a working directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileNames {
    /// Stage-1 model-input template (found via the control-file links).
    pub model_template: String,
    /// Rendered stage-1 model input.
    pub model_input: String,
    /// Name prefix of the stage-1 output the reformatter reads.
    pub stage1_output_prefix: String,
    /// Reformatted stage-2 model (`fort.8`).
    pub stage2_intermediate: String,
    /// Stage-2 runtime-input template.
    pub synthesis_template: String,
    /// Rendered stage-2 runtime input.
    pub synthesis_input: String,
    /// Second copy of the runtime input; the synthesis tool always reads
    /// this one (`fort.95`).
    pub synthesis_legacy_input: String,
}

impl Default for FileNames {
    fn default() -> Self {
        Self {
            model_template: "kurucz_model.tmpl".to_string(),
            model_input: "t10000_400_72.mod.7011870916".to_string(),
            stage1_output_prefix: "t10000_400_72_strat.mod".to_string(),
            stage2_intermediate: "fort.8".to_string(),
            synthesis_template: "input_tlusty_fortfive.tmpl".to_string(),
            synthesis_input: "input_tlusty_fortfive".to_string(),
            synthesis_legacy_input: "fort.95".to_string(),
        }
    }
}

impl FileNames {
    pub(crate) fn all(&self) -> [(&'static str, &str); 7] {
        [
            ("model_template", self.model_template.as_str()),
            ("model_input", self.model_input.as_str()),
            ("stage1_output_prefix", self.stage1_output_prefix.as_str()),
            ("stage2_intermediate", self.stage2_intermediate.as_str()),
            ("synthesis_template", self.synthesis_template.as_str()),
            ("synthesis_input", self.synthesis_input.as_str()),
            ("synthesis_legacy_input", self.synthesis_legacy_input.as_str()),
        ]
    }
}

/// `[executor]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecutorSection {
    /// Wall-clock limit per step; the process is killed when it expires.
    pub step_timeout_secs: u64,

    pub on_step_failure: FailurePolicy,

    pub args_mode: ArgsMode,

    pub stack_limit: StackLimitMode,

    /// Capacity of the inbound calculation channel.
    pub queue_length: usize,
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            step_timeout_secs: 30 * 60,
            on_step_failure: FailurePolicy::default(),
            args_mode: ArgsMode::default(),
            stack_limit: StackLimitMode::default(),
            queue_length: 16,
        }
    }
}

impl ExecutorSection {
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }
}
