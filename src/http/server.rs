//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router accepting any method on any path
//! - Wire up middleware (tracing)
//! - Bind server to listener
//! - Select a backend per request and forward to it
//! - Run the health monitor alongside the server

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::health::{HealthMonitor, HealthTracker};
use crate::http::forward::ProxyForwarder;
use crate::http::request::RequestId;
use crate::lifecycle::Shutdown;
use crate::load_balancer::{Backend, BackendRegistry, RoundRobin};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub selector: Arc<RoundRobin>,
    pub forwarder: ProxyForwarder,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    registry: Arc<BackendRegistry>,
    monitor: HealthMonitor,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let registry = Arc::new(BackendRegistry::new(
            config.backends.iter().map(Backend::from),
        ));
        let selector = Arc::new(RoundRobin::new(Arc::clone(&registry)));
        let forwarder = ProxyForwarder::new(&config.timeouts);
        let monitor = HealthMonitor::new(Arc::clone(&registry), config.health_check.clone());

        let state = AppState {
            selector,
            forwarder,
        };

        let router = Self::build_router(state);
        Self {
            router,
            registry,
            monitor,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }

    /// Shared pool state; the same instance the request path reads.
    pub fn registry(&self) -> Arc<BackendRegistry> {
        Arc::clone(&self.registry)
    }

    /// Per-backend probe state maintained by the health monitor.
    pub fn health(&self) -> Arc<HealthTracker> {
        self.monitor.tracker()
    }

    /// Run the server until `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.registry.configured().len(),
            "HTTP server starting"
        );

        let monitor_shutdown = shutdown.clone();
        let monitor = self.monitor;
        tokio::spawn(async move {
            monitor.run(monitor_shutdown).await;
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.notified())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Selects the next healthy backend and streams the request through it.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let started = Instant::now();
    let request_id = RequestId::from_headers(request.headers());
    let method = request.method().clone();
    let uri = request.uri().clone();

    let Some(backend) = state.selector.next() else {
        tracing::warn!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            "No healthy backends available"
        );
        let err = ProxyError::NoHealthyBackend;
        metrics::record_request(method.as_str(), err.status().as_u16(), "none", started);
        return err.into_response();
    };

    tracing::info!(
        request_id = %request_id,
        backend = %backend,
        method = %method,
        uri = %uri,
        "Forwarding request"
    );

    let backend_label = backend.to_string();
    match state.forwarder.forward(request, &backend).await {
        Ok(response) => {
            tracing::debug!(
                request_id = %request_id,
                backend = %backend,
                status = %response.status(),
                "Backend responded"
            );
            metrics::record_request(method.as_str(), response.status().as_u16(), &backend_label, started);
            response
        }
        Err(err) => {
            tracing::error!(
                request_id = %request_id,
                backend = %backend,
                error = %err,
                "Upstream request failed"
            );
            metrics::record_request(method.as_str(), err.status().as_u16(), &backend_label, started);
            err.into_response()
        }
    }
}
