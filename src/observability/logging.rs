//! Structured logging.
//!
//! `RUST_LOG` takes precedence; otherwise the configured level applies to
//! this crate and to `tower_http`'s request spans.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
pub fn init(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("lb_proxy={level},tower_http={level}"))
}
