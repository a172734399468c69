//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Detect duplicate backends
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("at least one backend must be configured")]
    NoBackends,

    #[error("backend #{index} has an empty host")]
    EmptyBackendHost { index: usize },

    #[error("backend {host}:0 has no port")]
    ZeroBackendPort { host: String },

    #[error("backend {host}:{port} is configured more than once")]
    DuplicateBackend { host: String, port: u16 },

    #[error("listener port must be non-zero")]
    ZeroListenerPort,

    #[error("health check path '{0}' must start with '/'")]
    InvalidHealthPath(String),

    #[error("health check interval must be greater than zero")]
    ZeroHealthInterval,

    #[error("health check timeout must be greater than zero")]
    ZeroHealthTimeout,

    #[error("health check timeout ({timeout_ms}ms) exceeds interval ({interval_ms}ms)")]
    HealthTimeoutExceedsInterval { timeout_ms: u64, interval_ms: u64 },

    #[error("connect timeout must be greater than zero")]
    ZeroConnectTimeout,
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroListenerPort);
    }

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    let mut seen = HashSet::new();
    for (index, backend) in config.backends.iter().enumerate() {
        if backend.host.trim().is_empty() {
            errors.push(ValidationError::EmptyBackendHost { index });
        }
        if backend.port == 0 {
            errors.push(ValidationError::ZeroBackendPort {
                host: backend.host.clone(),
            });
        }
        if !seen.insert((backend.host.as_str(), backend.port)) {
            errors.push(ValidationError::DuplicateBackend {
                host: backend.host.clone(),
                port: backend.port,
            });
        }
    }

    let health = &config.health_check;
    if !health.path.starts_with('/') {
        errors.push(ValidationError::InvalidHealthPath(health.path.clone()));
    }
    if health.interval_ms == 0 {
        errors.push(ValidationError::ZeroHealthInterval);
    }
    if health.timeout_ms == 0 {
        errors.push(ValidationError::ZeroHealthTimeout);
    }
    if health.interval_ms > 0 && health.timeout_ms > health.interval_ms {
        errors.push(ValidationError::HealthTimeoutExceedsInterval {
            timeout_ms: health.timeout_ms,
            interval_ms: health.interval_ms,
        });
    }

    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
