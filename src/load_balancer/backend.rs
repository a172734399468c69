//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream server by its (host, port) identity
//! - Provide the authority used when building outbound URIs

use std::fmt;

use crate::config::BackendConfig;

/// A single backend server.
///
/// Identity is the `(host, port)` pair: two backends with the same host and
/// port are the same backend, whatever order they were configured in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Backend {
    host: String,
    port: u16,
}

impl Backend {
    /// Create a new backend.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, suitable for a URI authority. IPv6 hosts are bracketed.
    pub fn authority(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl From<&BackendConfig> for Backend {
    fn from(config: &BackendConfig) -> Self {
        Self::new(config.host.clone(), config.port)
    }
}
