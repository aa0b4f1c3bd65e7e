//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum app exposing one batch endpoint
//! - Map methods: POST → dispatch, OPTIONS → 204, others → 405
//! - Map unknown paths to 404
//! - Wire up middleware (tracing, timeout, body limit, request ID, headers)
//! - Serve until the shutdown broadcast fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::BlestConfig;
use crate::http::request::{context_from_headers, X_REQUEST_ID};
use crate::protocol::error::BatchError;
use crate::routing::Router as BlestRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<BlestRouter>,
}

/// HTTP transport for a route registry.
pub struct HttpServer {
    app: Router,
    config: BlestConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving `router` with the given configuration.
    pub fn new(config: BlestConfig, router: BlestRouter) -> Self {
        let state = AppState {
            router: Arc::new(router),
        };
        let app = Self::build_app(&config, state);
        Self { app, config }
    }

    /// Build the Axum app with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &BlestConfig, state: AppState) -> Router {
        let cors_origin = HeaderValue::from_str(&config.server.cors_origin)
            .unwrap_or_else(|_| HeaderValue::from_static("*"));

        Router::new()
            .route(
                &config.server.path,
                post(batch_handler).options(preflight_handler),
            )
            .fallback(not_found_handler)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                cors_origin,
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("content-type, authorization"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("POST, OPTIONS"),
            ))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The Axum app, for embedding or in-process testing.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            path = %self.config.server.path,
            "HTTP server starting"
        );

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &BlestConfig {
        &self.config
    }
}

/// Parse the body, dispatch the batch, and map the outcome to HTTP.
async fn batch_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let start = Instant::now();
    let request_id = headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let batch: Value = match serde_json::from_slice(&body) {
        Ok(batch) => batch,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Unparsable request body");
            return error_response(BatchError::bad_request("Request should be valid JSON"));
        }
    };

    let context = context_from_headers(&headers);
    match state.router.handle(&batch, &context).await {
        Ok(items) => {
            tracing::debug!(
                request_id = %request_id,
                batch_size = items.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Batch handled"
            );
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn preflight_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn error_response(err: BatchError) -> Response {
    let status = StatusCode::from_u16(err.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({ "message": err.message, "status": status.as_u16() })),
    )
        .into_response()
}
