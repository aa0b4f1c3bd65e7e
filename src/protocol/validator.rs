//! Structural validation of an inbound batch.
//!
//! # Responsibilities
//! - Check the batch is a non-empty array of arrays
//! - Check each item has a non-empty string id and route
//! - Check optional parameters are an object and selector is an array
//! - Reject duplicate ids
//!
//! # Design Decisions
//! - Pure function: `&Value → Result<Vec<Call>, BatchError>`
//! - Short-circuits on the first violation, in rule order
//! - All-or-nothing: a malformed id could misroute responses, so one bad
//!   item rejects the whole batch with 400
//! - Falsy optional elements (`null`, `false`, `0`, `""`, `{}`, `[]`) count
//!   as absent

use std::collections::HashSet;

use serde_json::Value;

use crate::protocol::error::BatchError;
use crate::protocol::wire::Call;

pub fn validate_batch(batch: &Value) -> Result<Vec<Call>, BatchError> {
    let items = match batch.as_array() {
        Some(items) if !items.is_empty() => items,
        _ => return Err(BatchError::bad_request("Request should be an array")),
    };

    let mut seen = HashSet::with_capacity(items.len());
    let mut calls = Vec::with_capacity(items.len());
    for item in items {
        let call = validate_item(item)?;
        if !seen.insert(call.id.clone()) {
            return Err(BatchError::bad_request("Request items should have unique IDs"));
        }
        calls.push(call);
    }
    Ok(calls)
}

fn validate_item(item: &Value) -> Result<Call, BatchError> {
    let fields = item
        .as_array()
        .ok_or_else(|| BatchError::bad_request("Request item should be an array"))?;

    let id = match fields.first() {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        _ => return Err(BatchError::bad_request("Request item should have an ID")),
    };

    let route = match fields.get(1) {
        Some(Value::String(route)) if !route.is_empty() => route.clone(),
        _ => return Err(BatchError::bad_request("Request item should have a route")),
    };

    let parameters = match fields.get(2).filter(|v| is_truthy(v)) {
        None => None,
        Some(Value::Object(parameters)) => Some(parameters.clone()),
        Some(_) => {
            return Err(BatchError::bad_request(
                "Request item parameters should be a JSON object",
            ))
        }
    };

    let selector = match fields.get(3).filter(|v| is_truthy(v)) {
        None => None,
        Some(Value::Array(selector)) => Some(selector.clone()),
        Some(_) => {
            return Err(BatchError::bad_request(
                "Request item selector should be a JSON array",
            ))
        }
    };

    Ok(Call {
        id,
        route,
        parameters,
        selector,
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
