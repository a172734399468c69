//! Request correlation.
//!
//! # Responsibilities
//! - Reuse an inbound `x-request-id` when the client supplies one
//! - Otherwise generate a UUID v4
//!
//! # Design Decisions
//! - The ID only decorates log records; inbound headers are forwarded
//!   to the backend untouched

use std::fmt;

use axum::http::HeaderMap;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Correlation ID for one proxied request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Take the client's `x-request-id`, or generate one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_string()))
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reuses_client_id() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc-123"));
        assert_eq!(RequestId::from_headers(&headers).as_str(), "abc-123");
    }

    #[test]
    fn generates_when_absent_or_empty() {
        let id = RequestId::from_headers(&HeaderMap::new());
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());

        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static(""));
        assert_ne!(RequestId::from_headers(&headers).as_str(), "");
    }
}
