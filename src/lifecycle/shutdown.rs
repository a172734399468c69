//! Shutdown coordination for the proxy.

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// The triggered flag is sticky: tasks that start waiting after `trigger`
/// still observe it. Clones share the same channel.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Signal every current and future waiter.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Resolve once `trigger` has been called, including before this call.
    pub fn notified(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            loop {
                let triggered = *rx.borrow_and_update();
                if triggered {
                    return;
                }
                // All senders dropped.
                if rx.changed().await.is_err() {
                    return;
                }
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
