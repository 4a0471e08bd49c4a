#![allow(dead_code)]

pub use ccb_worker_test_utils::builders;
pub use ccb_worker_test_utils::scripted_runner::ScriptedRunner;
pub use ccb_worker_test_utils::{init_tracing, with_timeout};

use std::path::Path;

use ccb_worker::fs::mock::MockFileSystem;

pub const ROOT: &str = "/nfs";
pub const CONTROL: &str = "/shared/control";
pub const DATA: &str = "/shared/data";

/// In-memory shared trees with both input templates and one data file.
pub fn shared_trees() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_dir(ROOT);
    fs.add_file(
        Path::new(CONTROL).join("kurucz_model.tmpl"),
        "TEFF {{.Teff}} GRAVITY {{.LogG}} LTE\n",
    );
    fs.add_file(
        Path::new(CONTROL).join("input_tlusty_fortfive.tmpl"),
        "{{.Teff}} {{.LogG}} F F\n",
    );
    fs.add_file(Path::new(DATA).join("gfATO.dat"), "lines");
    fs
}

/// Seed the stage-1 output the reformatter reads for `calc`.
pub fn seed_stage1_output(fs: &MockFileSystem, calc: &str) {
    fs.add_file(
        Path::new(ROOT).join(calc).join("t10000_400_72_strat.mod"),
        "TEFF   10125.  GRAVITY 4.25000 LTE\nREAD DECK6 72 RHOX,T,P\n 1.0   2.0\n",
    );
}
