//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a BLEST
//! server and client. All types derive Serde traits for deserialization
//! from TOML files; every section has defaults so a minimal file works.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::routing::RouterOptions;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BlestConfig {
    /// HTTP transport settings.
    pub server: ServerConfig,

    /// Route registry defaults.
    pub routing: RoutingConfig,

    /// Batching client settings.
    pub client: ClientConfig,

    /// Transport-level timeouts.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl BlestConfig {
    pub fn router_options(&self) -> RouterOptions {
        RouterOptions {
            default_timeout_ms: self.routing.default_timeout_ms,
            introspection: self.routing.introspection,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Path accepting batches.
    pub path: String,

    /// Largest accepted request body.
    pub max_body_bytes: usize,

    /// Value of `Access-Control-Allow-Origin`.
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            path: "/".to_string(),
            max_body_bytes: 1024 * 1024,
            cors_origin: "*".to_string(),
        }
    }
}

/// Route registry defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Per-route timeout when a route sets none. 0 disables.
    pub default_timeout_ms: u64,

    /// Serve the `_routes` system route.
    pub introspection: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        let options = RouterOptions::default();
        Self {
            default_timeout_ms: options.default_timeout_ms,
            introspection: options.introspection,
        }
    }
}

/// Batching client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Batch endpoint.
    pub url: String,

    /// Most calls sent in one HTTP batch.
    pub max_batch_size: usize,

    /// How long a flush window stays open.
    pub batch_delay_ms: u64,

    /// Extra headers sent with every batch.
    pub headers: HashMap<String, String>,

    /// Ceiling on one batch exchange, connect to last byte.
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/".to_string(),
            max_batch_size: 25,
            batch_delay_ms: 10,
            headers: HashMap::new(),
            request_timeout_ms: 30_000,
        }
    }
}

/// Timeout configuration for the HTTP exchange.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole request/response ceiling in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter; `RUST_LOG` wins when set.
    pub log_filter: String,

    /// Serve Prometheus metrics.
    pub metrics_enabled: bool,

    /// Metrics listener address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "blest=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: BlestConfig = toml::from_str(
            r#"
            [routing]
            introspection = true

            [client]
            max_batch_size = 50
            "#,
        )
        .unwrap();

        assert!(config.routing.introspection);
        assert_eq!(config.routing.default_timeout_ms, 5000);
        assert_eq!(config.client.max_batch_size, 50);
        assert_eq!(config.client.batch_delay_ms, 10);
        assert_eq!(config.client.request_timeout_ms, 30_000);
        assert_eq!(config.server.path, "/");
        assert_eq!(config.router_options().default_timeout_ms, 5000);
    }
}
