//! Round-robin HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                 LOAD BALANCER                │
//!                        │                                              │
//!   Client Request       │  ┌────────┐    ┌─────────────┐               │
//!   ─────────────────────┼─▶│  http  │───▶│ round_robin │               │
//!                        │  │ server │    │  selector   │               │
//!                        │  └────────┘    └──────┬──────┘               │
//!                        │                       │ snapshot             │
//!                        │                       ▼                      │
//!                        │                ┌─────────────┐   mark_*      │
//!                        │                │  registry   │◀──────────┐   │
//!                        │                └─────────────┘           │   │
//!                        │                                          │   │
//!   Client Response      │  ┌─────────┐                      ┌─────┴─┐ │
//!   ◀────────────────────┼──│ forward │◀────────────────────▶│health │ │◀──▶ Backends
//!                        │  └─────────┘                      │monitor│ │
//!                        │                                   └───────┘ │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use lb_proxy::config::{self, BackendConfig, ConfigError, ProxyConfig};
use lb_proxy::lifecycle::{self, Shutdown};
use lb_proxy::observability::{logging, metrics};
use lb_proxy::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "lb-proxy", version)]
#[command(about = "Round-robin HTTP load balancer with active health checks", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file).
    #[arg(short, long)]
    port: Option<u16>,

    /// Backend to balance across; repeat for several. Replaces configured backends.
    #[arg(short, long = "backend", value_name = "HOST:PORT")]
    backends: Vec<BackendConfig>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if !self.backends.is_empty() {
            config.backends = self.backends;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        config::validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init(&config.observability.log_level);
    tracing::info!("lb-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        backends = ?config.backends.iter().map(|b| format!("{}:{}", b.host, b.port)).collect::<Vec<_>>(),
        health_path = %config.health_check.path,
        health_interval_ms = config.health_check.interval_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_socket_addr() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        lifecycle::wait_for_signal().await;
        trigger.trigger();
    });

    HttpServer::new(config).run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
