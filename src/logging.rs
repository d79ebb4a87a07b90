//! Logging setup for applications embedding this crate.
//!
//! The library itself only emits `tracing` events; binaries call [`init`]
//! once at startup to get a stderr subscriber honoring `RUST_LOG`.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize a stderr subscriber. Level defaults to `info` unless
/// `RUST_LOG` says otherwise. Safe to call more than once; later calls are
/// no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Initialize logging for tests (captured per-test output).
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
