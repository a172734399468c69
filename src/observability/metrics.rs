//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lb_requests_total` (counter): requests by method, status, backend
//! - `lb_request_duration_seconds` (histogram): time to response headers
//! - `lb_backend_healthy` (gauge): 1=healthy, 0=unhealthy, per backend
//! - `lb_probe_cycle_duration_seconds` (histogram): wall time of a probe cycle

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::load_balancer::Backend;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one proxied request. `backend` is `"none"` when the pool was empty.
pub fn record_request(method: &str, status: u16, backend: &str, started: Instant) {
    metrics::counter!(
        "lb_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "backend" => backend.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "lb_request_duration_seconds",
        "method" => method.to_string(),
        "backend" => backend.to_string()
    )
    .record(started.elapsed().as_secs_f64());
}

pub fn record_backend_health(backend: &Backend, healthy: bool) {
    metrics::gauge!("lb_backend_healthy", "backend" => backend.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_probe_cycle(started: Instant) {
    metrics::histogram!("lb_probe_cycle_duration_seconds").record(started.elapsed().as_secs_f64());
}
