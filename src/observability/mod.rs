//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and histograms)
//!
//! Consumers:
//!     → stdout log aggregation
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Call id and route flow through every per-call log event
//! - Metrics are cheap and disabled unless an exporter is installed

pub mod logging;
pub mod metrics;
