//! Log subscriber setup for binaries, demos and tests
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! caller's choice. `RUST_LOG` overrides the default directive.

use tracing_subscriber::EnvFilter;

/// Install a formatted stderr subscriber filtered by `RUST_LOG`, falling
/// back to `default_directive` (e.g. `"scout_doe=info"`).
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
