//! Logging utilities
//!
//! Provides logging configuration and helpers.

use tracing_subscriber::EnvFilter;

/// Initialize the logger. RUST_LOG overrides the default filter.
pub fn init_logger() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("partest=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
