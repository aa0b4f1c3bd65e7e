//! Metrics collection and exposition.
//!
//! # Metrics
//! - `blest_calls_total` (counter): calls by route, status
//! - `blest_call_duration_seconds` (histogram): per-call latency by route
//! - `blest_batch_size` (histogram): calls per accepted batch
//! - `blest_batches_rejected_total` (counter): batches failing validation
//! - `blest_client_flushes_total` (counter): client batches by outcome
//! - `blest_client_batch_size` (histogram): calls per client batch
//!
//! # Design Decisions
//! - Recording is a no-op until `init_metrics` installs the exporter
//! - Route label is the registered route name; every unknown route shares
//!   `_unknown`, so callers cannot grow the series count

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_call(route: &str, status: u16, start: Instant) {
    metrics::counter!(
        "blest_calls_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("blest_call_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_batch(size: usize) {
    metrics::histogram!("blest_batch_size").record(size as f64);
}

pub fn record_batch_rejected() {
    metrics::counter!("blest_batches_rejected_total").increment(1);
}

pub fn record_client_flush(size: usize, delivered: bool) {
    let outcome = if delivered { "delivered" } else { "transport_error" };
    metrics::counter!("blest_client_flushes_total", "outcome" => outcome).increment(1);
    metrics::histogram!("blest_client_batch_size").record(size as f64);
}
