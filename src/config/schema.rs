//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files and
//! every field has a default, so an empty file is a valid configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::backoff::BackoffPolicy;
use crate::store::{Credentials, RemoteOptions};

/// Root configuration shared by the REST server and the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// REST listener and middleware.
    pub http: HttpConfig,

    /// How the REST server reaches the storage backend.
    pub backend: BackendConfig,

    /// Storage backend server settings.
    pub storage: StorageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// REST server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// Answer CORS preflights and add permissive CORS headers.
    pub cors_enabled: bool,

    /// Gzip responses when the client accepts it.
    pub compression_enabled: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_size: 1024 * 1024,
            cors_enabled: true,
            compression_enabled: true,
        }
    }
}

/// Client-side settings for the storage backend connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend host name or IP.
    pub host: String,

    /// Backend port. The storage server listens on the same port.
    pub port: u16,

    /// Shared username; auth is enabled only when password is set too.
    pub username: Option<String>,

    /// Shared password.
    pub password: Option<String>,

    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Attempts per storage call before giving up (first try included).
    pub max_attempts: u32,

    /// Base delay for reconnect backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for reconnect backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl BackendConfig {
    /// `host:port` to connect to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Credentials when both username and password are configured.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials::new(username.clone(), password.clone())),
            _ => None,
        }
    }

    /// Everything `RemoteStore::connect` needs.
    pub fn remote_options(&self) -> RemoteOptions {
        RemoteOptions {
            address: self.address(),
            credentials: self.credentials(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            backoff: self.backoff(),
        }
    }

    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: self.max_attempts,
            base_delay_ms: self.base_delay_ms,
            max_delay_ms: self.max_delay_ms,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4567,
            username: None,
            password: None,
            connect_timeout_secs: 5,
            max_attempts: 3,
            base_delay_ms: 50,
            max_delay_ms: 1000,
        }
    }
}

/// Storage backend server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Interface to bind; the port comes from `backend.port`.
    pub bind_host: String,

    /// Directory holding the store log.
    pub dest: PathBuf,

    /// Maximum concurrent client connections.
    pub max_connections: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            dest: PathBuf::from("db"),
            max_connections: 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins when set.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

impl AppConfig {
    /// Address the storage backend binds.
    pub fn storage_bind_address(&self) -> String {
        format!("{}:{}", self.storage.bind_host, self.backend.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.http.bind_address, "0.0.0.0:8080");
        assert_eq!(config.backend.address(), "127.0.0.1:4567");
        assert_eq!(config.storage_bind_address(), "0.0.0.0:4567");
        assert!(config.backend.credentials().is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [backend]
            port = 5000
            username = "alice"
            password = "secret"

            [observability]
            log_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.address(), "127.0.0.1:5000");
        assert_eq!(config.backend.max_attempts, 3);
        assert_eq!(config.backend.credentials(), Some(Credentials::new("alice", "secret")));
        assert_eq!(config.observability.log_level, "debug");
        assert!(!config.observability.metrics_enabled);

        let options = config.backend.remote_options();
        assert_eq!(options.address, "127.0.0.1:5000");
        assert_eq!(options.connect_timeout, Duration::from_secs(5));
        assert!(options.credentials.is_some());
    }

    #[test]
    fn credentials_need_both_halves() {
        let backend = BackendConfig {
            username: Some("alice".into()),
            ..Default::default()
        };
        assert!(backend.credentials().is_none());
    }
}
