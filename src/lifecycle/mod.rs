//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_shutdown_signal() returns
//!
//! Shutdown (shutdown.rs):
//!     trigger() → broadcast → HttpServer stops accepting → in-flight batches drain → exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; every long-running task subscribes
//! - Batches already dispatched finish before the server returns

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_shutdown_signal;
