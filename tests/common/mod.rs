//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::json;
use tokio::net::TcpListener;

use blest::routing::{handler, sync_handler, RouterOptions};
use blest::{BlestConfig, HandlerError, HttpServer, Router, Shutdown};

/// A running server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Routes used across the integration suites.
pub fn test_router() -> Router {
    test_router_with(RouterOptions::default())
}

pub fn test_router_with(options: RouterOptions) -> Router {
    let mut router = Router::with_options(options);
    router
        .add_before(sync_handler(|_, ctx| {
            ctx.insert("seen", true);
            Ok(None)
        }))
        .register(
            "hello",
            sync_handler(|_, _| Ok(Some(json!({ "hello": "world", "hola": "mundo" })))),
        )
        .unwrap()
        .register(
            "echo",
            sync_handler(|params, ctx| {
                Ok(Some(json!({
                    "params": params,
                    "route": ctx.get_str("routeName"),
                    "seen": ctx.get("seen"),
                    "auth": ctx.get("headers").and_then(|h| h.get("authorization")),
                })))
            }),
        )
        .unwrap()
        .register(
            "math",
            sync_handler(|params, _| {
                let dividend = params.get("dividend").and_then(|v| v.as_f64()).unwrap_or(0.0);
                let divisor = params.get("divisor").and_then(|v| v.as_f64()).unwrap_or(0.0);
                if divisor == 0.0 {
                    return Err(HandlerError::new("Division by zero")
                        .with_status(400)
                        .with_code("DIVISION_BY_ZERO"));
                }
                Ok(Some(json!({
                    "status": "ok",
                    "result": { "quotient": dividend / divisor, "extra": 1 },
                    "other": 2
                })))
            }),
        )
        .unwrap()
        .register(
            "slow",
            handler(|_, _| {
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Ok(Some(json!({ "done": true })))
                })
            }),
        )
        .unwrap()
        .register(
            "fail",
            sync_handler(|_, _| Err(HandlerError::new("Intentional failure"))),
        )
        .unwrap();
    router.describe("slow", &json!({ "timeout": 50 })).unwrap();
    router
}

/// Serve `router` on 127.0.0.1 with an OS-assigned port.
pub async fn spawn_server(config: BlestConfig, router: Router) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, router);
    tokio::spawn(server.run(listener, shutdown.subscribe()));
    TestServer { addr, shutdown }
}

pub async fn spawn_test_server() -> TestServer {
    spawn_server(BlestConfig::default(), test_router()).await
}
