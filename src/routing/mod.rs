//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Setup (before serving):
//!     register(name, chain)
//!     → name.rs (route-name grammar)
//!     → registry.rs (wrap with registry middleware/afterware, store entry)
//!     → describe / merge / namespace
//!
//! Per batch:
//!     Router::handle
//!     → Arc snapshot of the route table
//!     → protocol::Dispatcher
//! ```
//!
//! # Design Decisions
//! - Route table is immutable once serving starts
//! - Exact name lookup (BTreeMap); no patterns, no wildcards
//! - Names beginning with `_` are reserved for system routes

pub mod handler;
pub mod name;
pub mod registry;

pub use handler::{handler, sync_handler, Handler, HandlerChain, HandlerResult, RouteHandler};
pub use name::{validate_route_name, RouteNameError};
pub use registry::{RouteEntry, RouteTable, Router, RouterError, RouterOptions, DEFAULT_TIMEOUT_MS};
