//! BLEST batch RPC server.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                     BLEST SERVER                      │
//!                     │                                                       │
//!  POST [[id, route,  │  ┌──────────┐   ┌───────────┐   ┌──────────────────┐  │
//!   params, sel]...]  │  │   http   │──▶│ validator │──▶│    dispatcher    │  │
//!  ───────────────────┼─▶│  server  │   │ (batch)   │   │ one task per call│  │
//!                     │  └──────────┘   └───────────┘   └────────┬─────────┘  │
//!                     │                                          │            │
//!                     │                         ┌────────────────┼──────┐     │
//!                     │                         ▼                ▼      ▼     │
//!                     │                   ┌──────────┐     ┌──────────┐       │
//!                     │                   │ pipeline │ ... │ pipeline │       │
//!                     │                   │ +timeout │     │ +timeout │       │
//!                     │                   └────┬─────┘     └────┬─────┘       │
//!                     │                        ▼                ▼             │
//!  [[id, route,       │                   ┌──────────────────────────┐        │
//!   result, err]...]  │                   │  selector projection     │        │
//!  ◀──────────────────┼───────────────────│  + per-item error shape  │        │
//!                     │                   └──────────────────────────┘        │
//!                     │                                                       │
//!                     │  config · observability · lifecycle (cross-cutting)   │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

use blest::config::{load_config, BlestConfig};
use blest::lifecycle::{wait_for_shutdown_signal, Shutdown};
use blest::observability::{logging, metrics};
use blest::routing::{sync_handler, RouterError};
use blest::{HandlerError, HttpServer, Router};

#[derive(Parser)]
#[command(name = "blest")]
#[command(about = "BLEST batch RPC server", long_about = None)]
struct Args {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Deserialize)]
struct MathParams {
    operation: String,
    dividend: f64,
    divisor: f64,
}

/// Routes served by the reference binary.
fn demo_router(config: &BlestConfig) -> Result<Router, RouterError> {
    let mut router = Router::with_options(config.router_options());

    router.add_before(sync_handler(|_, ctx| {
        let user = ctx
            .get("headers")
            .and_then(|h| h.get("authorization"))
            .and_then(|v| v.as_str())
            .map(|v| v.trim_start_matches("Bearer ").to_string());
        if let Some(user) = user {
            ctx.insert("user", user);
        }
        Ok(None)
    }));

    router
        .register(
            "hello",
            sync_handler(|_, _| {
                Ok(Some(json!({
                    "hello": "world",
                    "bonjour": "le monde",
                    "hola": "mundo",
                    "hallo": "welt"
                })))
            }),
        )?
        .register(
            "greet",
            sync_handler(|params, _| {
                let name = params
                    .get("name")
                    .and_then(|n| n.as_str())
                    .ok_or_else(|| HandlerError::new("Name is required").with_status(400))?;
                Ok(Some(json!({ "greeting": format!("Hi, {name}!") })))
            }),
        )?
        .register(
            "math",
            sync_handler(|params, _| {
                let params: MathParams = serde_json::from_value(params.clone())?;
                if params.operation != "divide" {
                    return Err(HandlerError::new(format!("Unsupported operation: {}", params.operation))
                        .with_status(400)
                        .with_code("UNSUPPORTED_OPERATION"));
                }
                if params.divisor == 0.0 {
                    return Err(HandlerError::new("Division by zero")
                        .with_status(400)
                        .with_code("DIVISION_BY_ZERO"));
                }
                Ok(Some(json!({
                    "status": format!("Successfully divided {} by {}", params.dividend, params.divisor),
                    "result": { "quotient": params.dividend / params.divisor }
                })))
            }),
        )?
        .register(
            "fail",
            sync_handler(|_, _| Err(HandlerError::new("Intentional failure"))),
        )?;

    router.describe(
        "math",
        &json!({
            "description": "Arithmetic on two numbers",
            "parameters": {
                "type": "object",
                "required": ["operation", "dividend", "divisor"]
            },
            "timeout": 1000
        }),
    )?;
    router.describe("fail", &json!({ "visible": false }))?;

    Ok(router)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => BlestConfig::default(),
    };

    logging::init_logging(&config.observability.log_filter);
    tracing::info!("blest v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.server.bind_address,
        path = %config.server.path,
        default_timeout_ms = config.routing.default_timeout_ms,
        introspection = config.routing.introspection,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let router = demo_router(&config)?;
    tracing::info!(routes = router.len(), "Routes registered");

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, router);
    let serving = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_shutdown_signal().await;
    shutdown.trigger();
    serving.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
