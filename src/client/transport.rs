//! Outbound batch transport.
//!
//! The scheduler only needs "send this batch, get the matched items back".
//! `HttpTransport` does that with a single reqwest POST.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::protocol::wire::{Call, ResultItem};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response batch: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid header {0:?}")]
    InvalidHeader(String),
}

pub trait BatchTransport: Send + Sync {
    /// Deliver one batch. Fails on network errors and non-2xx statuses.
    fn post<'a>(&'a self, batch: &'a [Call]) -> BoxFuture<'a, Result<Vec<ResultItem>, TransportError>>;
}

/// POSTs batches as JSON to a fixed URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
    headers: HeaderMap,
}

impl HttpTransport {
    /// `timeout` bounds the whole exchange; a silent server fails the batch.
    pub fn new(
        url: Url,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_str(name)
                .map_err(|_| TransportError::InvalidHeader(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| TransportError::InvalidHeader(name.to_string()))?;
            header_map.insert(name, value);
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url,
            headers: header_map,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl BatchTransport for HttpTransport {
    fn post<'a>(&'a self, batch: &'a [Call]) -> BoxFuture<'a, Result<Vec<ResultItem>, TransportError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.url.clone())
                .headers(self.headers.clone())
                .json(batch)
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            Ok(serde_json::from_str(&body)?)
        })
    }
}
