//! Logging setup.
//!
//! The crate emits `tracing` events; binaries and tests pick a subscriber.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a formatted subscriber filtered by `RUST_LOG` (default `info`).
///
/// # Example
/// ```no_run
/// u_stoch_schedule::logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Installs a debug-level subscriber writing through the test harness.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("u_stoch_schedule=debug"))
        .with_test_writer()
        .try_init();
}
