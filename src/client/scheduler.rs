//! Client batching scheduler.
//!
//! `Client` handles are cheap to clone and only talk to a single actor task
//! over an unbounded channel. The actor opens a flush window when the first
//! call arrives, keeps collecting until `batch_delay` elapses or the window
//! holds `max_batch_size` calls, then hands the window to its own flush task
//! and starts over. Calls still queued after a full window land in the next
//! window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use uuid::Uuid;

use crate::client::transport::{BatchTransport, HttpTransport};
use crate::config::schema::ClientConfig;
use crate::observability::metrics;
use crate::protocol::error::ErrorInfo;
use crate::protocol::wire::Call;

pub type CallResult = Result<Map<String, Value>, ClientError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// Rejected locally before queueing.
    #[error("{0}")]
    InvalidRequest(&'static str),

    /// The server answered this call with an error item.
    #[error("{0}")]
    Remote(ErrorInfo),

    /// The batch carrying this call never got a response.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("no response received for call {0}")]
    MissingResponse(String),

    #[error("client scheduler is closed")]
    Closed,

    #[error("invalid client configuration: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub max_batch_size: usize,
    pub batch_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 25,
            batch_delay: Duration::from_millis(10),
        }
    }
}

impl From<&ClientConfig> for SchedulerConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_batch_size: config.max_batch_size.max(1),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
        }
    }
}

struct QueuedCall {
    call: Call,
    respond_to: oneshot::Sender<CallResult>,
}

/// Handle for issuing calls through the batching scheduler.
#[derive(Debug, Clone)]
pub struct Client {
    queue: mpsc::UnboundedSender<QueuedCall>,
}

impl Client {
    /// Spawn the scheduler actor. Must be called inside a Tokio runtime.
    pub fn new(transport: Arc<dyn BatchTransport>, config: SchedulerConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(scheduler_task(rx, transport, config));
        Self { queue: tx }
    }

    /// Client speaking HTTP to `config.url`.
    pub fn http(config: &ClientConfig) -> Result<Self, ClientError> {
        let url = config
            .url
            .parse()
            .map_err(|e: url::ParseError| ClientError::Config(format!("url: {e}")))?;
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let transport = HttpTransport::new(url, &config.headers, timeout)
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(Self::new(Arc::new(transport), SchedulerConfig::from(config)))
    }

    /// Queue one call and wait for its matched response.
    pub async fn request(
        &self,
        route: &str,
        parameters: Option<Value>,
        selector: Option<Value>,
    ) -> CallResult {
        let call = build_call(route, parameters, selector)?;
        let (tx, rx) = oneshot::channel();
        self.queue
            .send(QueuedCall {
                call,
                respond_to: tx,
            })
            .map_err(|_| ClientError::Closed)?;
        rx.await.map_err(|_| ClientError::Closed)?
    }
}

fn build_call(route: &str, parameters: Option<Value>, selector: Option<Value>) -> Result<Call, ClientError> {
    if route.is_empty() {
        return Err(ClientError::InvalidRequest("Route is required"));
    }
    let parameters = match parameters {
        None | Some(Value::Null) => None,
        Some(Value::Object(parameters)) => Some(parameters),
        Some(_) => return Err(ClientError::InvalidRequest("Parameters should be a JSON object")),
    };
    let selector = match selector {
        None | Some(Value::Null) => None,
        Some(Value::Array(selector)) => Some(selector),
        Some(_) => return Err(ClientError::InvalidRequest("Selector should be a JSON array")),
    };
    Ok(Call {
        id: Uuid::new_v4().to_string(),
        route: route.to_string(),
        parameters,
        selector,
    })
}

async fn scheduler_task(
    mut rx: mpsc::UnboundedReceiver<QueuedCall>,
    transport: Arc<dyn BatchTransport>,
    config: SchedulerConfig,
) {
    let max_batch_size = config.max_batch_size.max(1);

    while let Some(first) = rx.recv().await {
        let flush_at = Instant::now() + config.batch_delay;
        let mut window = vec![first];

        while window.len() < max_batch_size {
            match tokio::time::timeout_at(flush_at, rx.recv()).await {
                Ok(Some(queued)) => window.push(queued),
                Ok(None) | Err(_) => break,
            }
        }

        tokio::spawn(flush(Arc::clone(&transport), window));
    }

    tracing::debug!("Client scheduler stopped");
}

async fn flush(transport: Arc<dyn BatchTransport>, window: Vec<QueuedCall>) {
    let mut pending: HashMap<String, oneshot::Sender<CallResult>> = HashMap::with_capacity(window.len());
    let mut calls = Vec::with_capacity(window.len());
    for queued in window {
        pending.insert(queued.call.id.clone(), queued.respond_to);
        calls.push(queued.call);
    }

    tracing::debug!(batch_size = calls.len(), "Flushing client batch");

    match transport.post(&calls).await {
        Ok(items) => {
            metrics::record_client_flush(calls.len(), true);
            for item in items {
                let Some(tx) = pending.remove(&item.id) else {
                    tracing::debug!(request_id = %item.id, "Ignoring response for unknown call");
                    continue;
                };
                let _ = tx.send(item.outcome.map_err(ClientError::Remote));
            }
            for (id, tx) in pending {
                tracing::warn!(request_id = %id, "Response batch omitted call");
                let _ = tx.send(Err(ClientError::MissingResponse(id)));
            }
        }
        Err(e) => {
            metrics::record_client_flush(calls.len(), false);
            tracing::error!(batch_size = calls.len(), error = %e, "Client batch failed");
            let message = e.to_string();
            for (_, tx) in pending {
                let _ = tx.send(Err(ClientError::Transport(message.clone())));
            }
        }
    }
}
