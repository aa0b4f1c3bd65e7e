//! Client side of the protocol.
//!
//! # Data Flow
//! ```text
//! Client::request(route, params, selector)
//!     → local shape checks (fail fast, never queued)
//!     → scheduler.rs actor queue
//!     → flush window closes (delay elapsed or batch full)
//!     → transport.rs (one HTTP POST per window)
//!     → responses matched by id → each caller's oneshot resolves
//! ```
//!
//! # Design Decisions
//! - One actor task owns the queue; callers only send into a channel
//! - Each flush owns the id → responder map for its own calls, so a
//!   transport failure can only reject that window
//! - Every responder is a oneshot: resolved or rejected exactly once

pub mod scheduler;
pub mod transport;

pub use scheduler::{Client, ClientError, SchedulerConfig};
pub use transport::{BatchTransport, HttpTransport, TransportError};
