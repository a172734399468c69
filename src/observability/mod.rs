//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request path and health monitor produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Every routing decision names the backend and the outcome
//! - Health transitions log once per change; steady state logs at debug
//! - Metrics are cheap no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
