//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher runs a call:
//!     → timeouts.rs (route deadline around the handler chain)
//!     → on expiry: per-call 500, siblings unaffected
//! ```
//!
//! # Design Decisions
//! - Every route has a deadline unless explicitly configured as 0
//! - Expiry is reported, not retried: calls may not be idempotent

pub mod timeouts;
