//! Logging setup for the binary.

use tracing_subscriber::EnvFilter;

use crate::config::LogSettings;

/// Install a stderr subscriber. `RUST_LOG` wins over the configured filter.
///
/// Calling this twice is harmless; the second call does nothing.
pub fn init(settings: &LogSettings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_env_filter(filter)
        .try_init();
}
