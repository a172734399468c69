//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, proxy handler)
//!     → request.rs (correlation ID for logs)
//!     → load_balancer picks a healthy backend (503 if none)
//!     → forward.rs (stream request out, response back; 502 on failure)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod server;

pub use forward::ProxyForwarder;
pub use request::{RequestId, X_REQUEST_ID};
pub use server::HttpServer;
