//! Wire representation of calls and results.
//!
//! A request item is `[id, route, parameters?, selector?]` and a response
//! item is `[id, route, result, error]`. Both travel as positional JSON
//! arrays, so the serde impls here are written by hand.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::protocol::error::ErrorInfo;

/// One logical RPC call inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub id: String,
    pub route: String,
    pub parameters: Option<Map<String, Value>>,
    pub selector: Option<Vec<Value>>,
}

impl Call {
    /// Parameters as handlers see them: an object, or `null` when absent.
    pub fn parameters_value(&self) -> Value {
        self.parameters
            .clone()
            .map(Value::Object)
            .unwrap_or(Value::Null)
    }

    pub fn selector_value(&self) -> Value {
        self.selector
            .clone()
            .map(Value::Array)
            .unwrap_or(Value::Null)
    }
}

impl Serialize for Call {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.id, &self.route, &self.parameters, &self.selector).serialize(serializer)
    }
}

/// Outcome of one call, matched back to its caller by `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultItem {
    pub id: String,
    pub route: String,
    pub outcome: Result<Map<String, Value>, ErrorInfo>,
}

impl ResultItem {
    pub fn success(id: String, route: String, result: Map<String, Value>) -> Self {
        Self {
            id,
            route,
            outcome: Ok(result),
        }
    }

    pub fn failure(id: String, route: String, error: ErrorInfo) -> Self {
        Self {
            id,
            route,
            outcome: Err(error),
        }
    }

    pub fn result(&self) -> Option<&Map<String, Value>> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.outcome.as_ref().err()
    }
}

impl Serialize for ResultItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.outcome {
            Ok(result) => {
                (&self.id, &self.route, Some(result), None::<&ErrorInfo>).serialize(serializer)
            }
            Err(error) => (
                &self.id,
                &self.route,
                None::<&Map<String, Value>>,
                Some(error),
            )
                .serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ResultItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Vec::<Value>::deserialize(deserializer)?.into_iter();

        let id = match fields.next() {
            Some(Value::String(id)) => id,
            _ => return Err(D::Error::custom("response item should have an ID")),
        };
        let route = match fields.next() {
            Some(Value::String(route)) => route,
            _ => return Err(D::Error::custom("response item should have a route")),
        };
        let result = fields.next().unwrap_or(Value::Null);
        let error = fields.next().unwrap_or(Value::Null);

        let outcome = if !error.is_null() {
            Err(serde_json::from_value(error).map_err(D::Error::custom)?)
        } else {
            match result {
                Value::Object(result) => Ok(result),
                Value::Null => Ok(Map::new()),
                _ => {
                    return Err(D::Error::custom(
                        "response item result should be an object",
                    ))
                }
            }
        };

        Ok(Self { id, route, outcome })
    }
}
