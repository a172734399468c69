//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::{backend::Backend, registry::BackendRegistry};

/// Round-robin selector over the registry's healthy snapshot.
///
/// The cursor is positional: it indexes whatever snapshot the call reads,
/// modulo its length. When membership changes between calls the rotation
/// stays even on average but is not strictly fair.
#[derive(Debug)]
pub struct RoundRobin {
    registry: Arc<BackendRegistry>,
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new(registry: Arc<BackendRegistry>) -> Self {
        Self {
            registry,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Pick the next healthy backend, or `None` if the pool is exhausted.
    pub fn next(&self) -> Option<Backend> {
        let snapshot = self.registry.snapshot_healthy();
        if snapshot.is_empty() {
            return None;
        }

        // fetch_add wraps on overflow, so the cursor never panics.
        let cursor = self.cursor.fetch_add(1, Ordering::Relaxed);
        snapshot.get(cursor % snapshot.len()).cloned()
    }
}
