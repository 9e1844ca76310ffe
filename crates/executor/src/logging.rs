use tracing_subscriber::{EnvFilter, fmt};

use super::config::LoggingConfig;

/// Installs the global tracing subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn init(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    fmt().with_env_filter(filter).with_target(false).init();
}
