//! Log output for the binary.
//!
//! Library crates log through the `log` facade; the subscriber installed
//! here picks those records up and writes them to stderr.

use tracing_subscriber::{fmt, EnvFilter};

/// `--log-level` wins over `RUST_LOG`; `--verbose` raises the default to debug
pub fn init(level: Option<&str>, verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
    };

    // Ignore a second init (tests may call this repeatedly)
    let _ = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
