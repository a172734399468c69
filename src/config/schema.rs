//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// Backend servers, in selection order.
    pub backends: Vec<BackendConfig>,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Outbound timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            backends: default_backends(),
            health_check: HealthCheckConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

fn default_backends() -> Vec<BackendConfig> {
    (8080..=8082)
        .map(|port| BackendConfig {
            host: "localhost".to_string(),
            port,
        })
        .collect()
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port the load balancer listens on.
    pub port: u16,
}

impl ListenerConfig {
    /// The `host:port` string handed to the TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Backend server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Hostname or IP address.
    pub host: String,

    /// TCP port.
    pub port: u16,
}

/// Error returned when a `host:port` backend address cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendParseError {
    #[error("expected HOST:PORT, got '{0}'")]
    MissingPort(String),
    #[error("invalid port in '{0}'")]
    InvalidPort(String),
    #[error("empty host in '{0}'")]
    EmptyHost(String),
}

impl FromStr for BackendConfig {
    type Err = BackendParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| BackendParseError::MissingPort(s.to_string()))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(BackendParseError::EmptyHost(s.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| BackendParseError::InvalidPort(s.to_string()))?;

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active health checks.
    pub enabled: bool,

    /// Path to probe with GET; a 200 means healthy.
    pub path: String,

    /// Delay between probe cycles in milliseconds.
    pub interval_ms: u64,

    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,
}

/// Floor applied to `interval_ms` when a config skipped validation.
pub const MIN_HEALTH_INTERVAL_MS: u64 = 1;

impl HealthCheckConfig {
    /// Delay between probe cycles, never zero.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(MIN_HEALTH_INTERVAL_MS))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/".to_string(),
            interval_ms: 10_000,
            timeout_ms: 2_000,
        }
    }
}

/// Timeout configuration for outbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Time allowed for the backend to send response headers, in seconds.
    /// Zero disables the deadline.
    pub response_secs: u64,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn response(&self) -> Option<Duration> {
        (self.response_secs > 0).then(|| Duration::from_secs(self.response_secs))
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 5_000,
            response_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl ObservabilityConfig {
    pub fn metrics_socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.metrics_address.parse()
    }
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
