//! BLEST protocol engine.
//!
//! # Data Flow
//! ```text
//! Parsed JSON body + transport context
//!     → validator.rs (structural shape checks, whole batch or nothing)
//!     → dispatcher.rs (resolve route, isolate context, spawn per call)
//!         → pipeline.rs (middleware → terminal handler → afterware)
//!         → resilience::timeouts (per-route deadline)
//!         → selector.rs (project successful results)
//!     → Vec<ResultItem> (one item per call id)
//! ```
//!
//! # Design Decisions
//! - Batch-level failures (`BatchError`) only come from the validator
//! - Per-call failures never leak into sibling calls
//! - Each call owns a deep copy of the context
//! - Responses are matched by id, never by position

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod pipeline;
pub mod selector;
pub mod validator;
pub mod wire;

pub use context::Context;
pub use dispatcher::Dispatcher;
pub use error::{BatchError, CallError, ErrorInfo, HandlerError};
pub use selector::project;
pub use validator::validate_batch;
pub use wire::{Call, ResultItem};
