//! Request forwarding to a selected backend.
//!
//! # Responsibilities
//! - Rebuild the inbound request against the backend's authority
//! - Stream the request body out and the response body back
//! - Map transport failures before response headers to `ProxyError`
//!
//! # Design Decisions
//! - Method, path+query and headers pass through unmodified
//! - Bodies are never buffered: the inbound `Body` is handed to the
//!   client as-is and the backend's `Incoming` becomes the response body
//! - A failure after headers were sent cannot be corrected; the body
//!   stream errors and hyper drops the client connection
//! - One attempt per request, no retries

use std::time::Duration;

use axum::body::Body;
use axum::http::uri::Scheme;
use axum::http::{Request, Response, Uri, Version};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TimeoutConfig;
use crate::error::ProxyError;
use crate::load_balancer::Backend;

/// Streams requests to backends over a pooled HTTP/1.1 client.
#[derive(Debug, Clone)]
pub struct ProxyForwarder {
    client: Client<HttpConnector, Body>,
    response_timeout: Option<Duration>,
}

impl ProxyForwarder {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeouts.connect()));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            response_timeout: timeouts.response(),
        }
    }

    /// Point `uri`'s path and query at `backend`, byte for byte.
    pub fn outbound_uri(uri: &Uri, backend: &Backend) -> Result<Uri, axum::http::Error> {
        let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(backend.authority())
            .path_and_query(path_and_query)
            .build()
    }

    /// Forward `request` to `backend` and return the streaming response.
    ///
    /// Resolves once the backend's response headers arrive; the body keeps
    /// streaming after this returns.
    pub async fn forward(
        &self,
        request: Request<Body>,
        backend: &Backend,
    ) -> Result<Response<Body>, ProxyError> {
        let (parts, body) = request.into_parts();

        let mut builder = Request::builder()
            .method(parts.method)
            .uri(Self::outbound_uri(&parts.uri, backend)?)
            .version(Version::HTTP_11);
        if let Some(headers) = builder.headers_mut() {
            *headers = parts.headers;
        }
        let outbound = builder.body(body)?;

        let pending = self.client.request(outbound);
        let result = match self.response_timeout {
            Some(after) => tokio::time::timeout(after, pending).await.map_err(|_| {
                ProxyError::UpstreamTimeout {
                    backend: backend.clone(),
                    after,
                }
            })?,
            None => pending.await,
        };

        let response: Response<Incoming> = result.map_err(|source| ProxyError::Upstream {
            backend: backend.clone(),
            source,
        })?;

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
