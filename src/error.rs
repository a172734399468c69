//! Request-path error types.
//!
//! Every failure on the request path resolves to a client-visible status:
//! an exhausted pool is a 503, anything that goes wrong talking to the
//! chosen backend is a 502.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::load_balancer::Backend;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Selection found an empty healthy set.
    #[error("no healthy backend available")]
    NoHealthyBackend,

    /// Connecting to or exchanging headers with the backend failed.
    #[error("backend {backend} failed: {source}")]
    Upstream {
        backend: Backend,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    /// The backend did not send response headers in time.
    #[error("backend {backend} sent no response within {after:?}")]
    UpstreamTimeout { backend: Backend, after: Duration },

    /// The outbound request could not be built.
    #[error("invalid outbound request: {0}")]
    InvalidRequest(#[from] axum::http::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NoHealthyBackend => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::Upstream { .. }
            | ProxyError::UpstreamTimeout { .. }
            | ProxyError::InvalidRequest(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match &self {
            ProxyError::NoHealthyBackend => "Service Unavailable: No healthy backends",
            _ => "Bad Gateway",
        };
        (self.status(), body).into_response()
    }
}
