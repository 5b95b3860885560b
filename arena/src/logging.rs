//! Tracing setup for the arena CLI.
//!
//! Match progress goes to stderr; stdout is reserved for command results.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "arena=info";

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`, defaulting to [`DEFAULT_FILTER`]. Output: stderr, compact
/// format.
///
/// # Example
/// ```bash
/// RUST_LOG=arena=debug ARENA_DEBUG=1 arena solo challengeContext.json
/// ```
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
