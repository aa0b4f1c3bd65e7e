//! Batch dispatcher.
//!
//! # Responsibilities
//! - Validate the batch, then run every call concurrently
//! - Give each call its own context copy and its route's deadline
//! - Project successful results through the call's selector
//! - Turn every failure into a per-item `ErrorInfo`
//!
//! # Design Decisions
//! - One Tokio task per call: a panic or a slow handler stays local
//! - Unknown routes are a per-item 404, never a batch failure
//! - Items come back in input order, but callers must match by id

use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use futures_util::future::join_all;
use serde_json::{Map, Value};

use crate::observability::metrics;
use crate::protocol::context::Context;
use crate::protocol::error::{BatchError, CallError};
use crate::protocol::pipeline::run_chain;
use crate::protocol::selector::project;
use crate::protocol::validator::validate_batch;
use crate::protocol::wire::{Call, ResultItem};
use crate::resilience::timeouts::with_timeout;
use crate::routing::registry::{RouteEntry, RouteTable, RouterOptions};

/// Reserved system route listing visible routes.
pub const INTROSPECTION_ROUTE: &str = "_routes";

/// Metrics label shared by every call to an unregistered route.
pub const UNKNOWN_ROUTE_LABEL: &str = "_unknown";

/// What a call resolved to.
enum Target {
    Route { entry: Arc<RouteEntry>, timeout_ms: u64 },
    Introspection(Map<String, Value>),
    NotFound,
}

/// Executes validated batches against a route table snapshot.
#[derive(Clone)]
pub struct Dispatcher {
    routes: Arc<RouteTable>,
    options: RouterOptions,
}

impl Dispatcher {
    pub fn new(routes: Arc<RouteTable>, options: RouterOptions) -> Self {
        Self { routes, options }
    }

    pub async fn handle(
        &self,
        batch: &Value,
        context: &Context,
    ) -> Result<Vec<ResultItem>, BatchError> {
        let calls = validate_batch(batch).inspect_err(|e| {
            tracing::warn!(status = e.status, reason = %e.message, "Batch rejected");
            metrics::record_batch_rejected();
        })?;

        metrics::record_batch(calls.len());
        tracing::debug!(batch_size = calls.len(), "Dispatching batch");

        let request_time = now_millis();
        let tasks = calls.into_iter().map(|call| {
            let ctx = Context::for_call(context, &call, request_time);
            let target = self.resolve(&call.route);
            let id = call.id.clone();
            let route = call.route.clone();
            let handle = tokio::spawn(execute_call(target, call, ctx));

            async move {
                match handle.await {
                    Ok(item) => item,
                    Err(e) => {
                        tracing::error!(request_id = %id, route = %route, error = %e, "Call task failed");
                        ResultItem::failure(id, route, CallError::Panicked.to_error_info())
                    }
                }
            }
        });

        Ok(join_all(tasks).await)
    }

    fn resolve(&self, route: &str) -> Target {
        if let Some(entry) = self.routes.get(route) {
            let timeout_ms = entry.timeout_ms().unwrap_or(self.options.default_timeout_ms);
            return Target::Route {
                entry: Arc::clone(entry),
                timeout_ms,
            };
        }
        if route == INTROSPECTION_ROUTE && self.options.introspection {
            return Target::Introspection(self.introspect());
        }
        Target::NotFound
    }

    fn introspect(&self) -> Map<String, Value> {
        let routes: Vec<Value> = self
            .routes
            .iter()
            .filter(|(_, entry)| entry.is_visible())
            .map(|(name, entry)| entry.summary(name))
            .collect();
        let mut listing = Map::new();
        listing.insert("routes".into(), Value::Array(routes));
        listing
    }
}

async fn execute_call(target: Target, call: Call, mut ctx: Context) -> ResultItem {
    let start = Instant::now();
    let label = route_label(&target, &call.route).to_string();

    let outcome = run_target(target, &call, &mut ctx)
        .await
        .map(|result| match &call.selector {
            Some(selector) => project(&result, selector),
            None => result,
        });

    let item = match outcome {
        Ok(result) => ResultItem::success(call.id, call.route, result),
        Err(err) => {
            log_failure(&call, &err);
            ResultItem::failure(call.id, call.route, err.to_error_info())
        }
    };

    let status = item.error().map(|e| e.status).unwrap_or(200);
    metrics::record_call(&label, status, start);
    item
}

async fn run_target(
    target: Target,
    call: &Call,
    ctx: &mut Context,
) -> Result<Map<String, Value>, CallError> {
    match target {
        Target::NotFound => Err(CallError::NotFound(call.route.clone())),
        Target::Introspection(listing) => Ok(listing),
        Target::Route { entry, timeout_ms } => {
            let params = call.parameters_value();
            with_timeout(timeout_ms, run_chain(entry.chain(), &params, ctx))
                .await
                .map_err(|elapsed| CallError::Timeout(elapsed.0))?
        }
    }
}

/// Caller-supplied names only reach metrics once they match a registered route.
fn route_label<'a>(target: &Target, route: &'a str) -> &'a str {
    match target {
        Target::NotFound => UNKNOWN_ROUTE_LABEL,
        _ => route,
    }
}

fn log_failure(call: &Call, err: &CallError) {
    match err {
        CallError::NotFound(_) => {
            tracing::debug!(request_id = %call.id, route = %call.route, "Route not found");
        }
        CallError::Timeout(timeout_ms) => {
            tracing::warn!(
                event = "timeout",
                request_id = %call.id,
                route = %call.route,
                timeout_ms = *timeout_ms,
                "Call timed out"
            );
        }
        CallError::Handler(e) if e.is_exposed() && e.status() < 500 => {
            tracing::debug!(request_id = %call.id, route = %call.route, status = e.status(), error = %e, "Handler rejected call");
        }
        _ => {
            tracing::error!(request_id = %call.id, route = %call.route, error = %err, "Call failed");
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
