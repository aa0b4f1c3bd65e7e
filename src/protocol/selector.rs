//! Result projection by selector tree.
//!
//! A selector is an ordered list whose elements are either a key (copied
//! verbatim) or a `[key, sub_selector]` pair (recursed into an object or an
//! array of objects). Empty projections are dropped at every level.
//!
//! Only the top-level selector is validated (by the batch validator). A
//! malformed nested sub-selector (missing, or not an array) is not an error:
//! that level is returned unfiltered. A pair without a string key is skipped.

use serde_json::{Map, Value};

pub fn project(object: &Map<String, Value>, selector: &[Value]) -> Map<String, Value> {
    let mut projected = Map::new();

    for element in selector {
        match element {
            Value::String(key) => {
                if let Some(value) = object.get(key) {
                    projected.insert(key.clone(), value.clone());
                }
            }
            Value::Array(pair) => {
                let Some(Value::String(key)) = pair.first() else {
                    continue;
                };
                let sub = pair.get(1).unwrap_or(&Value::Null);
                let Some(value) = object.get(key) else {
                    continue;
                };
                if let Some(nested) = project_nested(value, sub) {
                    projected.insert(key.clone(), nested);
                }
            }
            _ => {}
        }
    }

    projected
}

fn project_nested(value: &Value, sub: &Value) -> Option<Value> {
    let Value::Array(sub) = sub else {
        return match value {
            Value::Object(_) | Value::Array(_) => Some(value.clone()),
            _ => None,
        };
    };

    match value {
        Value::Array(elements) => {
            let kept: Vec<Value> = elements
                .iter()
                .filter_map(Value::as_object)
                .map(|element| project(element, sub))
                .filter(|p| !p.is_empty())
                .map(Value::Object)
                .collect();
            (!kept.is_empty()).then_some(Value::Array(kept))
        }
        Value::Object(inner) => {
            let p = project(inner, sub);
            (!p.is_empty()).then_some(Value::Object(p))
        }
        _ => None,
    }
}
