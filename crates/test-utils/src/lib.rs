//! Shared test helpers for `menusync`: config and store builders, task-group
//! and hook doubles, and a scriptable plugin backend.

pub mod builders;
pub mod doubles;
pub mod fake_backend;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use menusync::logging::LOG_ENV_VAR;
use tracing_subscriber::{fmt, EnvFilter};

static TRACING: Once = Once::new();

/// Upper bound for any single async test step.
pub const TEST_DEADLINE: Duration = Duration::from_secs(5);

/// Route `tracing` output through the test harness, once per test binary.
///
/// Output shows up only for failing tests (or with `--nocapture`). Levels
/// come from `MENUSYNC_LOG`, then `RUST_LOG`, then `info`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_DEADLINE`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_DEADLINE, f).await {
        Ok(value) => value,
        Err(_) => panic!("test step did not finish within {TEST_DEADLINE:?}"),
    }
}
