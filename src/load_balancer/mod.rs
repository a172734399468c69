//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrives
//!     → round_robin.rs (take healthy snapshot, advance cursor)
//!     → registry.rs (configured set + healthy subset)
//!     → backend.rs (host:port identity of the chosen server)
//!     → Return backend, or None when the pool is exhausted
//!
//! Health monitor
//!     → registry.rs mark_healthy / mark_unhealthy
//! ```
//!
//! # Design Decisions
//! - The registry is the only pool state shared across tasks
//! - Selection never blocks: snapshots are lock-free loads
//! - Unhealthy backends are excluded from selection, not from probing

pub mod backend;
pub mod registry;
pub mod round_robin;

pub use backend::Backend;
pub use registry::BackendRegistry;
pub use round_robin::RoundRobin;
