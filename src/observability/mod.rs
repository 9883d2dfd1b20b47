//! Observability module for logging and dispatch metrics

pub mod metrics;

use crate::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use metrics::{DispatchMetrics, MetricsSnapshot};

/// Initialize logging and tracing
///
/// `RUST_LOG` takes precedence over `log_level` when set. Returns an error
/// if a global subscriber is already installed.
pub fn init_observability(
    log_level: &str,
    format: &str,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    match format {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        "compact" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    }
}

/// Initialize logging from a [`LoggingConfig`]
pub fn init_from_config(
    config: &LoggingConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    init_observability(&config.level, &config.format)
}
