//! Request handling.
//!
//! # Responsibilities
//! - Turn transport headers into the batch-level context
//! - Carry the transport request id into that context
//!
//! # Design Decisions
//! - Header names are lowercased; non-UTF-8 values are skipped
//! - The context is built once per HTTP exchange and copied per call by the
//!   dispatcher

use axum::http::HeaderMap;
use serde_json::{Map, Value};

use crate::protocol::context::Context;

/// Header carrying the transport-level request id.
pub const X_REQUEST_ID: &str = "x-request-id";

pub fn context_from_headers(headers: &HeaderMap) -> Context {
    let mut header_map = Map::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            header_map.insert(name.as_str().to_ascii_lowercase(), Value::String(value.to_string()));
        }
    }

    let mut ctx = Context::new();
    if let Some(Value::String(request_id)) = header_map.get(X_REQUEST_ID) {
        ctx.insert("httpRequestId", request_id.clone());
    }
    ctx.insert("headers", Value::Object(header_map));
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_context_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer token"));
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("req-1"));
        headers.insert("x-binary", HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap());

        let ctx = context_from_headers(&headers);
        assert_eq!(ctx.get_str("httpRequestId"), Some("req-1"));
        assert_eq!(
            ctx.get("headers"),
            Some(&json!({ "authorization": "Bearer token", "x-request-id": "req-1" }))
        );
    }
}
