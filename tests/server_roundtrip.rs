//! End-to-end HTTP exchanges against a live server.

mod common;

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde_json::{json, Value};

use blest::config::BlestConfig;
use common::{spawn_server, spawn_test_server, test_router_with};

async fn post(url: &str, body: &str) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(url)
        .header("content-type", "application/json")
        .header("authorization", "Bearer token-1")
        .body(body.to_string())
        .send()
        .await
        .unwrap();
    let status = response.status();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

fn item<'a>(items: &'a Value, id: &str) -> &'a Value {
    items
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item[0] == id)
        .unwrap_or_else(|| panic!("no item with id {id}"))
}

#[tokio::test]
async fn test_mixed_batch_returns_one_item_per_call() {
    let server = spawn_test_server().await;
    let batch = json!([
        ["a", "hello"],
        ["b", "math", { "dividend": 22, "divisor": 7 }, ["status", ["result", ["quotient"]]]],
        ["c", "math", { "dividend": 1, "divisor": 0 }],
        ["d", "fail"],
        ["e", "nope"],
        ["f", "echo", { "x": 1 }]
    ]);

    let (status, items) = post(&server.url(), &batch.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items.as_array().unwrap().len(), 6);

    assert_eq!(item(&items, "a"), &json!(["a", "hello", { "hello": "world", "hola": "mundo" }, null]));

    let projected = &item(&items, "b")[2];
    assert_eq!(projected["status"], "ok");
    assert!(projected.get("other").is_none());
    assert!(projected["result"].get("extra").is_none());
    assert!(projected["result"]["quotient"].as_f64().unwrap() > 3.14);

    assert_eq!(
        item(&items, "c")[3],
        json!({ "message": "Division by zero", "status": 400, "code": "DIVISION_BY_ZERO" })
    );
    assert_eq!(item(&items, "d")[3], json!({ "message": "Intentional failure", "status": 500 }));
    assert_eq!(item(&items, "e"), &json!(["e", "nope", null, { "message": "Not Found", "status": 404 }]));

    let echoed = &item(&items, "f")[2];
    assert_eq!(echoed["params"], json!({ "x": 1 }));
    assert_eq!(echoed["route"], "echo");
    assert_eq!(echoed["seen"], true);
    assert_eq!(echoed["auth"], "Bearer token-1");
}

#[tokio::test]
async fn test_timeout_does_not_delay_siblings() {
    let server = spawn_test_server().await;
    let start = Instant::now();
    let (status, items) = post(&server.url(), r#"[["slow", "slow"], ["fast", "hello"]]"#).await;

    assert_eq!(status, StatusCode::OK);
    assert!(start.elapsed() < Duration::from_millis(400));
    assert_eq!(item(&items, "slow")[3], json!({ "message": "Internal Server Error", "status": 500 }));
    assert_eq!(item(&items, "fast")[3], Value::Null);
}

#[tokio::test]
async fn test_invalid_batches_are_rejected_whole() {
    let server = spawn_test_server().await;

    let cases = [
        (r#"{"a": 1}"#, "Request should be an array"),
        (r#"["a"]"#, "Request item should be an array"),
        (r#"[["a"]]"#, "Request item should have a route"),
        (r#"[["a", "hello", [1]]]"#, "Request item parameters should be a JSON object"),
        (r#"[["a", "hello", null, "x"]]"#, "Request item selector should be a JSON array"),
        (r#"[["a", "hello"], ["a", "fail"]]"#, "Request items should have unique IDs"),
        ("not json", "Request should be valid JSON"),
    ];

    for (body, message) in cases {
        let (status, error) = post(&server.url(), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(error, json!({ "message": message, "status": 400 }), "{body}");
    }
}

#[tokio::test]
async fn test_empty_batch_is_rejected() {
    let server = spawn_test_server().await;
    let (status, error) = post(&server.url(), "[]").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["message"], "Request should be an array");
}

#[tokio::test]
async fn test_method_and_path_status_codes() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let get = client.get(server.url()).send().await.unwrap();
    assert_eq!(get.status(), StatusCode::METHOD_NOT_ALLOWED);

    let options = client
        .request(reqwest::Method::OPTIONS, server.url())
        .send()
        .await
        .unwrap();
    assert_eq!(options.status(), StatusCode::NO_CONTENT);
    assert_eq!(options.headers()["access-control-allow-origin"], "*");
    assert!(options.headers().contains_key("x-request-id"));

    let missing = client
        .post(format!("{}other", server.url()))
        .body("[]")
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_introspection_lists_visible_routes() {
    let mut config = BlestConfig::default();
    config.routing.introspection = true;
    let mut router = test_router_with(config.router_options());
    router
        .describe("echo", &json!({ "visible": false, "description": "hidden" }))
        .unwrap();
    router
        .describe("hello", &json!({ "description": "Greets the world" }))
        .unwrap();
    let server = spawn_server(config, router).await;

    let (status, items) = post(&server.url(), r#"[["r", "_routes"]]"#).await;
    assert_eq!(status, StatusCode::OK);

    let routes = item(&items, "r")[2]["routes"].as_array().unwrap().clone();
    let names: Vec<&str> = routes.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["fail", "hello", "math", "slow"]);
    assert_eq!(routes[1]["description"], "Greets the world");
    assert_eq!(routes[3]["timeout"], 50);
}

#[tokio::test]
async fn test_introspection_disabled_is_not_found() {
    let server = spawn_test_server().await;
    let (_, items) = post(&server.url(), r#"[["r", "_routes"]]"#).await;
    assert_eq!(item(&items, "r")[3]["status"], 404);
}
