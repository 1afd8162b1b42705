//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check that addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.http.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "http.bind_address",
            format!("{:?} is not a socket address", config.http.bind_address),
        ));
    }
    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::new("http.request_timeout_secs", "must be greater than 0"));
    }
    if config.http.max_body_size == 0 {
        errors.push(ValidationError::new("http.max_body_size", "must be greater than 0"));
    }

    if config.backend.host.trim().is_empty() {
        errors.push(ValidationError::new("backend.host", "must not be empty"));
    }
    if config.backend.port == 0 {
        errors.push(ValidationError::new("backend.port", "must not be 0"));
    }
    if config.backend.username.is_some() != config.backend.password.is_some() {
        errors.push(ValidationError::new(
            "backend.username",
            "username and password must be set together",
        ));
    }
    if config.backend.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("backend.connect_timeout_secs", "must be greater than 0"));
    }
    if config.backend.max_attempts == 0 {
        errors.push(ValidationError::new("backend.max_attempts", "must be at least 1"));
    }
    if config.backend.base_delay_ms > config.backend.max_delay_ms {
        errors.push(ValidationError::new(
            "backend.base_delay_ms",
            "must not exceed backend.max_delay_ms",
        ));
    }

    if config.storage.max_connections == 0 {
        errors.push(ValidationError::new("storage.max_connections", "must be greater than 0"));
    }
    if config.storage_bind_address().parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "storage.bind_host",
            format!("{:?} is not an IP address", config.storage.bind_host),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("{:?} is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
