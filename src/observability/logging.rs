//! Structured logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the configured level applies to
/// this crate and `tower_http`, with everything else at `warn`.
pub fn init_logging(config: &ObservabilityConfig) {
    let fallback = format!(
        "warn,level_time={level},tower_http={level}",
        level = config.log_level
    );

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
    {
        eprintln!("logging already initialised: {}", e);
    }
}
