//! Request-scoped context threaded through a handler chain.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::protocol::wire::Call;

/// Mutable key/value state owned by exactly one call.
///
/// The dispatcher never hands out the batch-level context: every call gets
/// its own copy from [`Context::for_call`], so middleware mutations stay
/// local to that call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(Map<String, Value>);

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Deep copy of `base` with the call metadata layered on top.
    pub fn for_call(base: &Context, call: &Call, request_time: u64) -> Context {
        let mut ctx = base.clone();
        ctx.insert("requestId", call.id.clone());
        ctx.insert("routeName", call.route.clone());
        ctx.insert("selector", call.selector_value());
        ctx.insert("requestTime", request_time);
        ctx
    }
}

impl From<Map<String, Value>> for Context {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
