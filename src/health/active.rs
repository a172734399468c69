//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every configured backend, healthy or not
//! - Update the registry and the per-backend state machine with the result

use std::error::Error as _;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use futures_util::future::join_all;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::lifecycle::Shutdown;
use crate::health::state::{HealthState, HealthTracker, Transition};
use crate::load_balancer::{Backend, BackendRegistry};
use crate::observability::metrics;

/// What a single probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The backend answered 200.
    Up,
    /// The backend answered, but not with 200.
    BadStatus(StatusCode),
    /// Connection refused, reset, DNS failure and the like.
    Unreachable(String),
    /// No response within the probe timeout.
    TimedOut(Duration),
}

impl ProbeOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeOutcome::Up)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Up => write!(f, "up"),
            ProbeOutcome::BadStatus(status) => write!(f, "status {}", status),
            ProbeOutcome::Unreachable(reason) => write!(f, "unreachable: {}", reason),
            ProbeOutcome::TimedOut(after) => write!(f, "timed out after {:?}", after),
        }
    }
}

pub struct HealthMonitor {
    registry: Arc<BackendRegistry>,
    tracker: Arc<HealthTracker>,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
}

impl HealthMonitor {
    pub fn new(registry: Arc<BackendRegistry>, config: HealthCheckConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.timeout()));

        // No idle pooling: every probe dials the backend afresh.
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(connector);

        let tracker = Arc::new(HealthTracker::new(registry.configured()));

        Self {
            registry,
            tracker,
            config,
            client,
        }
    }

    /// Per-backend probe state, shared with whoever wants to inspect it.
    pub fn tracker(&self) -> Arc<HealthTracker> {
        Arc::clone(&self.tracker)
    }

    /// Run probe cycles every interval until shutdown.
    ///
    /// The first cycle starts one interval after launch; until then every
    /// backend is assumed healthy. A cycle always finishes before the next
    /// one is scheduled.
    pub async fn run(self, shutdown: Shutdown) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval_ms = self.config.interval_ms,
            timeout_ms = self.config.timeout_ms,
            path = %self.config.path,
            backends = self.registry.configured().len(),
            "Health monitor starting"
        );

        if self.config.interval_ms == 0 {
            tracing::warn!(
                interval = ?self.config.interval(),
                "Health check interval of zero replaced by the minimum"
            );
        }

        let mut ticker = time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        let stopped = shutdown.notified();
        tokio::pin!(stopped);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = &mut stopped => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run one probe cycle against every configured backend concurrently.
    ///
    /// Each probe resolves and is applied on its own; a slow or dead
    /// backend only delays the cycle by at most the probe timeout.
    pub async fn check_all(&self) {
        let started = Instant::now();

        let probes = self.registry.configured().iter().map(|backend| async move {
            let outcome = self.probe(backend).await;
            self.apply(backend, &outcome);
        });
        join_all(probes).await;

        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            healthy = self.registry.snapshot_healthy().len(),
            configured = self.registry.configured().len(),
            "Probe cycle complete"
        );
        metrics::record_probe_cycle(started);
    }

    /// Probe one backend with `GET <path>`, bounded by the probe timeout.
    pub async fn probe(&self, backend: &Backend) -> ProbeOutcome {
        let uri = format!("http://{}{}", backend.authority(), self.config.path);
        let request = match Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::USER_AGENT, "lb-proxy-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => return ProbeOutcome::Unreachable(e.to_string()),
        };

        let timeout = self.config.timeout();
        match time::timeout(timeout, self.client.request(request)).await {
            Ok(Ok(response)) if response.status() == StatusCode::OK => ProbeOutcome::Up,
            Ok(Ok(response)) => ProbeOutcome::BadStatus(response.status()),
            Ok(Err(e)) => {
                let reason = match e.source() {
                    Some(cause) => format!("{}: {}", e, cause),
                    None => e.to_string(),
                };
                ProbeOutcome::Unreachable(reason)
            }
            Err(_) => ProbeOutcome::TimedOut(timeout),
        }
    }

    fn apply(&self, backend: &Backend, outcome: &ProbeOutcome) {
        let healthy = outcome.is_healthy();
        let pool_changed = if healthy {
            self.registry.mark_healthy(backend)
        } else {
            self.registry.mark_unhealthy(backend)
        };

        match self.tracker.record(backend, healthy) {
            Transition::Changed {
                from: HealthState::Unhealthy,
                to: HealthState::Healthy,
            } => {
                tracing::info!(backend = %backend, pool_changed, "Backend is back online");
            }
            Transition::Changed {
                to: HealthState::Unhealthy,
                from,
            } => {
                tracing::warn!(
                    backend = %backend,
                    outcome = %outcome,
                    previous = %from,
                    pool_changed,
                    "Backend is unhealthy, removed from rotation"
                );
            }
            transition => {
                tracing::debug!(backend = %backend, outcome = %outcome, ?transition, "Probe complete");
            }
        }

        metrics::record_backend_health(backend, healthy);
    }
}
