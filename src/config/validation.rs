//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs parse
//! - Validate value ranges (sizes and timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BlestConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::BlestConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("server.path {0:?} should start with '/'")]
    Path(String),

    #[error("server.max_body_bytes should be greater than zero")]
    BodyLimit,

    #[error("client.url {0:?} is not a valid URL")]
    ClientUrl(String),

    #[error("client.max_batch_size should be greater than zero")]
    BatchSize,

    #[error("client.request_timeout_ms should be greater than zero")]
    ClientTimeout,

    #[error("timeouts.request_secs should be greater than zero")]
    RequestTimeout,

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

pub fn validate_config(config: &BlestConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.server.bind_address.clone()));
    }
    if !config.server.path.starts_with('/') {
        errors.push(ValidationError::Path(config.server.path.clone()));
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::BodyLimit);
    }
    if Url::parse(&config.client.url).is_err() {
        errors.push(ValidationError::ClientUrl(config.client.url.clone()));
    }
    if config.client.max_batch_size == 0 {
        errors.push(ValidationError::BatchSize);
    }
    if config.client.request_timeout_ms == 0 {
        errors.push(ValidationError::ClientTimeout);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
