//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → CLI overrides applied by main
//!     → ProxyConfig (validated, immutable)
//!     → consumed once by HttpServer::new
//! ```
//!
//! # Design Decisions
//! - Config is fixed for the life of the process
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    BackendConfig, BackendParseError, HealthCheckConfig, ListenerConfig, ObservabilityConfig,
    ProxyConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
