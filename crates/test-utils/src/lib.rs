//! Shared helpers for the launcher's integration tests: scripted process
//! backends, scripted readiness probes, config builders and a couple of
//! tracing/timeout utilities.

pub mod builders;
pub mod fake_backend;
pub mod fake_probe;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

/// Default budget for [`with_timeout`].
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness capture.
///
/// Output only shows for failing tests (or with `--nocapture`). The filter is
/// read from `RUST_LOG` and defaults to `info`; e.g.
/// `RUST_LOG=backend_launcher=debug` to watch the supervisor.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        // Another harness may already own the global subscriber.
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_TIMEOUT`].
///
/// Under `start_paused` this bounds virtual time, not wall time.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    with_timeout_of(TEST_TIMEOUT, f).await
}

/// Like [`with_timeout`] with a caller-chosen budget, for scenarios that
/// legitimately wait longer (startup deadlines, grace periods).
#[allow(dead_code)]
pub async fn with_timeout_of<F, T>(limit: Duration, f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(limit, f).await {
        Ok(value) => value,
        Err(_) => panic!("scenario did not finish within {limit:?}"),
    }
}
