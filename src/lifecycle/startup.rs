//! Startup steps shared by the REST server and the storage backend.
//!
//! Order: config → logging → metrics → listener. Any error is fatal.

use std::path::Path;

use tokio::net::TcpListener;

use crate::config::{load_config, AppConfig, ConfigError};
use crate::observability::{logging, metrics};

/// Load the configuration and install logging and (optionally) metrics.
pub fn bootstrap(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let config = load_config(config_path)?;
    logging::init_logging(&config.observability);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    Ok(config)
}

/// Bind a listener, logging the resolved address.
pub async fn bind(address: &str, role: &'static str) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(address).await?;
    tracing::info!(role, address = %listener.local_addr()?, "Listening for connections");
    Ok(listener)
}
