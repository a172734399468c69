//! Backend health state machine.
//!
//! # States
//! - Unknown: configured, not yet probed (still receives traffic)
//! - Healthy: last probe returned 200
//! - Unhealthy: last probe failed; excluded from load balancing
//!
//! # State Transitions
//! ```text
//! Unknown   → Healthy   : probe returned 200
//! Unknown   → Unhealthy : non-200, connection error or timeout
//! Healthy  ←→ Unhealthy : on the next probe with the opposite outcome
//! ```
//!
//! # Design Decisions
//! - One probe decides; there is no hysteresis
//! - Each backend's state is independent of the others
//! - Identical consecutive outcomes are reported as `Unchanged`

use dashmap::DashMap;

use crate::load_balancer::Backend;

/// Health State enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown,
    Healthy,
    Unhealthy,
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HealthState::Unknown => "unknown",
            HealthState::Healthy => "healthy",
            HealthState::Unhealthy => "unhealthy",
        };
        f.write_str(s)
    }
}

/// Result of feeding one probe outcome into the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged(HealthState),
    Changed { from: HealthState, to: HealthState },
}

/// Per-backend probe state, written by the health monitor.
#[derive(Debug, Default)]
pub struct HealthTracker {
    states: DashMap<Backend, HealthState>,
}

impl HealthTracker {
    /// Track `backends`, all starting in `Unknown`.
    pub fn new<'a>(backends: impl IntoIterator<Item = &'a Backend>) -> Self {
        let states = backends
            .into_iter()
            .map(|b| (b.clone(), HealthState::Unknown))
            .collect();
        Self { states }
    }

    pub fn state(&self, backend: &Backend) -> HealthState {
        self.states
            .get(backend)
            .map_or(HealthState::Unknown, |s| *s)
    }

    /// Apply one probe outcome and report what changed.
    pub fn record(&self, backend: &Backend, healthy: bool) -> Transition {
        let to = if healthy {
            HealthState::Healthy
        } else {
            HealthState::Unhealthy
        };

        let mut entry = self
            .states
            .entry(backend.clone())
            .or_insert(HealthState::Unknown);
        let from = *entry;
        *entry = to;

        if from == to {
            Transition::Unchanged(to)
        } else {
            Transition::Changed { from, to }
        }
    }
}
