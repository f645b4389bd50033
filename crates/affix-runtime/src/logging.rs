#![forbid(unsafe_code)]

//! Logging bootstrap for tests and demos.
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! application's call. This helper installs a `fmt` subscriber filtered by
//! `RUST_LOG` (default `warn`).

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn";

/// Install a test-friendly `fmt` subscriber.
///
/// Output goes through the test harness capture. Calling this more than once
/// is harmless: later calls leave the first subscriber in place.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_test_logging();
        init_test_logging();
        tracing::debug!("still alive");
    }
}
