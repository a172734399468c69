//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe every configured backend concurrently
//!     → Update state.rs
//!     → mark_healthy / mark_unhealthy on the registry
//!
//! State machine (state.rs):
//!     Unknown → Healthy ←→ Unhealthy
//! ```
//!
//! # Design Decisions
//! - Unhealthy backends keep being probed so they can recover
//! - A single probe outcome decides the state
//! - Health state is per-backend, not per-pool

pub mod active;
pub mod state;

pub use active::{HealthMonitor, ProbeOutcome};
pub use state::{HealthState, HealthTracker, Transition};
