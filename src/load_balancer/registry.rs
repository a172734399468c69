//! Backend registry: the configured pool and its healthy subset.
//!
//! # Responsibilities
//! - Hold the configured backends (fixed at startup, ordered)
//! - Hold the healthy subset, always a subset of the configured set
//! - Publish consistent snapshots to the selection path
//!
//! # Design Decisions
//! - The healthy set is an immutable `Vec` behind an `ArcSwap`; writers
//!   replace it with read-copy-update, readers never take a lock
//! - Snapshots are rebuilt in configured order, so flapping backends do not
//!   reshuffle the rotation

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::load_balancer::backend::Backend;

/// Shared pool state for the request path and the health monitor.
#[derive(Debug)]
pub struct BackendRegistry {
    configured: Vec<Backend>,
    healthy: ArcSwap<Vec<Backend>>,
}

impl BackendRegistry {
    /// Create a registry where every configured backend starts healthy.
    ///
    /// Duplicate `(host, port)` entries are collapsed, keeping the first.
    pub fn new(backends: impl IntoIterator<Item = Backend>) -> Self {
        let mut configured: Vec<Backend> = Vec::new();
        for backend in backends {
            if !configured.contains(&backend) {
                configured.push(backend);
            }
        }

        let healthy = ArcSwap::from_pointee(configured.clone());
        Self {
            configured,
            healthy,
        }
    }

    /// All configured backends in configuration order.
    pub fn configured(&self) -> &[Backend] {
        &self.configured
    }

    /// Point-in-time copy of the healthy set, in configured order.
    pub fn snapshot_healthy(&self) -> Arc<Vec<Backend>> {
        self.healthy.load_full()
    }

    pub fn is_healthy(&self, backend: &Backend) -> bool {
        self.healthy.load().contains(backend)
    }

    /// Add `backend` to the healthy set.
    ///
    /// Returns `true` if membership changed. Backends that were never
    /// configured are ignored.
    pub fn mark_healthy(&self, backend: &Backend) -> bool {
        if !self.configured.contains(backend) {
            tracing::debug!(backend = %backend, "Ignoring health update for unconfigured backend");
            return false;
        }

        let previous = self.healthy.rcu(|current| {
            if current.contains(backend) {
                Arc::clone(current)
            } else {
                let next: Vec<Backend> = self
                    .configured
                    .iter()
                    .filter(|b| *b == backend || current.contains(b))
                    .cloned()
                    .collect();
                Arc::new(next)
            }
        });
        !previous.contains(backend)
    }

    /// Remove `backend` from the healthy set.
    ///
    /// Returns `true` if membership changed.
    pub fn mark_unhealthy(&self, backend: &Backend) -> bool {
        let previous = self.healthy.rcu(|current| {
            if current.contains(backend) {
                let next: Vec<Backend> = current
                    .iter()
                    .filter(|b| *b != backend)
                    .cloned()
                    .collect();
                Arc::new(next)
            } else {
                Arc::clone(current)
            }
        });
        previous.contains(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn pool() -> (BackendRegistry, Backend, Backend, Backend) {
        let b1 = Backend::new("localhost", 8080);
        let b2 = Backend::new("localhost", 8081);
        let b3 = Backend::new("localhost", 8082);
        let registry = BackendRegistry::new(vec![b1.clone(), b2.clone(), b3.clone()]);
        (registry, b1, b2, b3)
    }

    #[test]
    fn starts_with_every_backend_healthy() {
        let (registry, b1, b2, b3) = pool();
        assert_eq!(*registry.snapshot_healthy(), vec![b1, b2, b3]);
    }

    #[test]
    fn duplicates_collapse_at_construction() {
        let b1 = Backend::new("localhost", 8080);
        let registry = BackendRegistry::new(vec![b1.clone(), b1.clone()]);
        assert_eq!(registry.configured(), &[b1.clone()]);
        assert_eq!(*registry.snapshot_healthy(), vec![b1]);
    }

    #[test]
    fn unhealthy_backend_is_excluded_until_marked_healthy() {
        let (registry, b1, b2, b3) = pool();

        assert!(registry.mark_unhealthy(&b2));
        for _ in 0..5 {
            assert!(!registry.snapshot_healthy().contains(&b2));
        }
        assert!(!registry.is_healthy(&b2));

        assert!(registry.mark_healthy(&b2));
        assert_eq!(*registry.snapshot_healthy(), vec![b1, b2, b3]);
    }

    #[test]
    fn marking_is_idempotent() {
        let (registry, b1, b2, b3) = pool();

        assert!(!registry.mark_healthy(&b1));
        assert!(!registry.mark_healthy(&b1));
        assert_eq!(registry.snapshot_healthy().len(), 3);

        assert!(registry.mark_unhealthy(&b3));
        assert!(!registry.mark_unhealthy(&b3));
        assert!(!registry.mark_unhealthy(&b3));
        assert_eq!(*registry.snapshot_healthy(), vec![b1, b2]);
    }

    #[test]
    fn recovery_restores_configured_order() {
        let (registry, b1, b2, b3) = pool();

        registry.mark_unhealthy(&b1);
        registry.mark_unhealthy(&b2);
        registry.mark_healthy(&b2);
        registry.mark_healthy(&b1);

        assert_eq!(*registry.snapshot_healthy(), vec![b1, b2, b3]);
    }

    #[test]
    fn unconfigured_backend_never_joins() {
        let (registry, ..) = pool();
        let stranger = Backend::new("elsewhere", 9999);

        assert!(!registry.mark_healthy(&stranger));
        assert!(!registry.snapshot_healthy().contains(&stranger));
        assert!(!registry.mark_unhealthy(&stranger));
    }

    #[test]
    fn snapshot_is_unaffected_by_later_writes() {
        let (registry, b1, ..) = pool();
        let before = registry.snapshot_healthy();
        registry.mark_unhealthy(&b1);

        assert!(before.contains(&b1));
        assert!(!registry.snapshot_healthy().contains(&b1));
    }

    #[test]
    fn concurrent_writers_do_not_lose_updates() {
        let backends: Vec<Backend> = (0..16).map(|i| Backend::new("10.0.0.1", 9000 + i)).collect();
        let registry = Arc::new(BackendRegistry::new(backends.clone()));

        let handles: Vec<_> = backends
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, backend)| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..200 {
                        registry.mark_unhealthy(&backend);
                        registry.mark_healthy(&backend);
                    }
                    if i % 2 == 0 {
                        registry.mark_unhealthy(&backend);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let expected: Vec<Backend> = backends
            .into_iter()
            .enumerate()
            .filter(|(i, _)| i % 2 == 1)
            .map(|(_, b)| b)
            .collect();
        assert_eq!(*registry.snapshot_healthy(), expected);
    }
}
