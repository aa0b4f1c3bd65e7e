//! BLEST batch RPC library.

pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod protocol;
pub mod resilience;
pub mod routing;

pub use client::Client;
pub use config::schema::BlestConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use protocol::{Context, HandlerError};
pub use routing::Router;
