//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum app, layers, method/path mapping)
//!     → request.rs (headers → batch-level context)
//!     → routing::Router::handle (protocol engine)
//!     → 200 JSON batch, or error status from BatchError
//! ```

pub mod request;
pub mod server;

pub use request::{context_from_headers, X_REQUEST_ID};
pub use server::HttpServer;
