//! Tracing subscriber setup.
//!
//! Controllers log state transitions at `info`, teardown details at
//! `debug`, and swallowed preload failures at `warn`. Binaries call
//! [`init`] once at startup; `RUST_LOG` overrides the default filter.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber with an `info` default filter.
pub fn init() {
    init_with_filter("info");
}

/// Install the global fmt subscriber with the given default filter
/// directive, overridable via `RUST_LOG`.
pub fn init_with_filter(directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
