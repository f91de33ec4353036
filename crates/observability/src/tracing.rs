//! Tracing/logging initialization.
//!
//! Binaries get JSON lines for log shipping; test harnesses get compact
//! human-readable output. Both honor `RUST_LOG`.

use tracing_subscriber::EnvFilter;

fn env_filter(default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

/// Initialize JSON tracing for a long-running process.
///
/// `default_directives` applies when `RUST_LOG` is unset. Safe to call
/// multiple times; subsequent calls are no-ops.
pub fn init(default_directives: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directives))
        .json()
        .with_current_span(false)
        .try_init();
}

/// Initialize compact tracing for tests and one-shot tools.
///
/// Keeps targets visible so engine/client log lines are attributable.
/// Safe to call from every test; only the first call installs.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("debug"))
        .compact()
        .with_test_writer()
        .try_init();
}
