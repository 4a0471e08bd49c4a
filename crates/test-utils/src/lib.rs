pub mod builders;
pub mod scripted_runner;

use std::sync::Once;

use ccb_worker::logging::{DEFAULT_DIRECTIVES, LOG_ENV};
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Reads the same `CCB_WORKER_LOG` directives as the worker binary, e.g.
/// `CCB_WORKER_LOG=ccb_worker::exec=debug cargo test`. Without it, executor
/// and workdir events are shown at `debug` so a failing pipeline test shows
/// every step it attempted.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{DEFAULT_DIRECTIVES},ccb_worker::exec=debug,ccb_worker::workdir=debug"
            ))
        });

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 10-second timeout.
///
/// Pipeline tests with real processes use 1-second step timeouts, so this
/// leaves room for a timed-out step plus the output drain grace.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}
