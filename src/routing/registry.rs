//! Route registry.
//!
//! # Responsibilities
//! - Map route names to handler chains and per-route metadata
//! - Snapshot registry middleware/afterware into each chain at registration
//! - Compose registries (`merge`, `namespace`)
//! - Hand a read-only route table to the dispatcher
//!
//! # Design Decisions
//! - Middleware added after a route is registered does not affect it
//! - Composition is all-or-nothing: collisions are checked before any insert
//! - Route table is shared as `Arc` so a dispatch snapshot is a pointer copy;
//!   mutation happens during setup only

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::protocol::context::Context;
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::error::BatchError;
use crate::protocol::wire::ResultItem;
use crate::routing::handler::{Handler, HandlerChain};
use crate::routing::name::{validate_route_name, RouteNameError};

/// Default per-route timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

pub type RouteTable = BTreeMap<String, Arc<RouteEntry>>;

/// Errors raised while building a registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouterError {
    #[error("invalid route name {name:?}: {reason}")]
    InvalidName { name: String, reason: RouteNameError },

    #[error("Route already exists: {0}")]
    Duplicate(String),

    #[error("Route not found: {0}")]
    NotFound(String),

    #[error("Route configuration should be an object")]
    ConfigNotObject,

    #[error("Route configuration field {field} {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },

    #[error("Router has no routes to copy")]
    EmptySource,
}

/// Registry-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterOptions {
    /// Applied to routes without their own timeout. `0` disables it.
    pub default_timeout_ms: u64,

    /// Expose the `_routes` system route.
    pub introspection: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            introspection: false,
        }
    }
}

/// A registered route: its effective chain plus descriptive metadata.
///
/// Metadata (`description`, `parameters`, `result`, `validate`) is for
/// introspection only and is never checked against real calls.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    chain: HandlerChain,
    timeout_ms: Option<u64>,
    visible: bool,
    validate: bool,
    description: Option<String>,
    parameters: Option<Value>,
    result: Option<Value>,
}

impl RouteEntry {
    fn new(chain: HandlerChain) -> Self {
        Self {
            chain,
            timeout_ms: None,
            visible: true,
            validate: false,
            description: None,
            parameters: None,
            result: None,
        }
    }

    pub fn chain(&self) -> &HandlerChain {
        &self.chain
    }

    pub fn timeout_ms(&self) -> Option<u64> {
        self.timeout_ms
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn validate(&self) -> bool {
        self.validate
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn parameters(&self) -> Option<&Value> {
        self.parameters.as_ref()
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Introspection record for `_routes`.
    pub fn summary(&self, name: &str) -> Value {
        let mut summary = Map::new();
        summary.insert("name".into(), json!(name));
        if let Some(description) = &self.description {
            summary.insert("description".into(), json!(description));
        }
        if let Some(parameters) = &self.parameters {
            summary.insert("parameters".into(), parameters.clone());
        }
        if let Some(result) = &self.result {
            summary.insert("result".into(), result.clone());
        }
        if let Some(timeout) = self.timeout_ms {
            summary.insert("timeout".into(), json!(timeout));
        }
        summary.insert("validate".into(), json!(self.validate));
        Value::Object(summary)
    }

    fn apply_description(&mut self, config: &Map<String, Value>) -> Result<(), RouterError> {
        // Check everything first so a bad field leaves the entry untouched.
        let description = match config.get("description") {
            None => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(invalid("description", "should be a string")),
        };
        let parameters = match config.get("parameters") {
            None => None,
            Some(v @ Value::Object(_)) => Some(v.clone()),
            Some(_) => return Err(invalid("parameters", "should be an object")),
        };
        let result = match config.get("result") {
            None => None,
            Some(v @ Value::Object(_)) => Some(v.clone()),
            Some(_) => return Err(invalid("result", "should be an object")),
        };
        let visible = match config.get("visible") {
            None => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => return Err(invalid("visible", "should be a boolean")),
        };
        let validate = match config.get("validate") {
            None => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => return Err(invalid("validate", "should be a boolean")),
        };
        let timeout = match config.get("timeout") {
            None => None,
            Some(v) => match v.as_u64() {
                Some(ms) if ms > 0 => Some(ms),
                _ => return Err(invalid("timeout", "should be a positive integer")),
            },
        };

        if description.is_some() {
            self.description = description;
        }
        if parameters.is_some() {
            self.parameters = parameters;
        }
        if result.is_some() {
            self.result = result;
        }
        if let Some(visible) = visible {
            self.visible = visible;
        }
        if let Some(validate) = validate {
            self.validate = validate;
        }
        if timeout.is_some() {
            self.timeout_ms = timeout;
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &'static str) -> RouterError {
    RouterError::InvalidConfig { field, reason }
}

/// Mapping from route name to handler chain.
#[derive(Clone, Default)]
pub struct Router {
    routes: Arc<RouteTable>,
    middleware: Vec<Handler>,
    afterware: Vec<Handler>,
    options: RouterOptions,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .field("middleware", &self.middleware.len())
            .field("afterware", &self.afterware.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RouterOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> RouterOptions {
        self.options
    }

    /// Prepend `middleware` to every route registered from now on.
    pub fn add_before(&mut self, middleware: Handler) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    /// Append `afterware` to every route registered from now on.
    pub fn add_after(&mut self, afterware: Handler) -> &mut Self {
        self.afterware.push(afterware);
        self
    }

    pub fn register(
        &mut self,
        name: &str,
        chain: impl Into<HandlerChain>,
    ) -> Result<&mut Self, RouterError> {
        validate_route_name(name).map_err(|reason| RouterError::InvalidName {
            name: name.to_string(),
            reason,
        })?;
        if self.routes.contains_key(name) {
            return Err(RouterError::Duplicate(name.to_string()));
        }

        let chain = chain.into().wrap(&self.middleware, &self.afterware);
        Arc::make_mut(&mut self.routes).insert(name.to_string(), Arc::new(RouteEntry::new(chain)));
        tracing::debug!(route = %name, "Route registered");
        Ok(self)
    }

    /// Partially update the metadata of an existing route.
    pub fn describe(&mut self, name: &str, config: &Value) -> Result<(), RouterError> {
        let config = config.as_object().ok_or(RouterError::ConfigNotObject)?;
        let entry = Arc::make_mut(&mut self.routes)
            .get_mut(name)
            .ok_or_else(|| RouterError::NotFound(name.to_string()))?;
        Arc::make_mut(entry).apply_description(config)
    }

    /// Copy every route of `other` under its own name.
    pub fn merge(&mut self, other: &Router) -> Result<(), RouterError> {
        self.absorb(None, other)
    }

    /// Copy every route of `other` as `prefix/name`.
    pub fn namespace(&mut self, prefix: &str, other: &Router) -> Result<(), RouterError> {
        validate_route_name(prefix).map_err(|reason| RouterError::InvalidName {
            name: prefix.to_string(),
            reason,
        })?;
        self.absorb(Some(prefix), other)
    }

    fn absorb(&mut self, prefix: Option<&str>, other: &Router) -> Result<(), RouterError> {
        if other.is_empty() {
            return Err(RouterError::EmptySource);
        }

        let mut incoming: Vec<(String, Arc<RouteEntry>)> = Vec::with_capacity(other.len());
        for (name, entry) in other.routes.iter() {
            let name = match prefix {
                Some(prefix) => {
                    let combined = format!("{prefix}/{name}");
                    validate_route_name(&combined).map_err(|reason| RouterError::InvalidName {
                        name: combined.clone(),
                        reason,
                    })?;
                    combined
                }
                None => name.clone(),
            };
            let entry = RouteEntry {
                chain: entry.chain.wrap(&self.middleware, &self.afterware),
                ..RouteEntry::clone(entry)
            };
            incoming.push((name, Arc::new(entry)));
        }

        if let Some((name, _)) = incoming.iter().find(|(name, _)| self.routes.contains_key(name)) {
            return Err(RouterError::Duplicate(name.clone()));
        }

        let routes = Arc::make_mut(&mut self.routes);
        for (name, entry) in incoming {
            tracing::debug!(route = %name, "Route copied");
            routes.insert(name, entry);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RouteEntry> {
        self.routes.get(name).map(Arc::as_ref)
    }

    pub fn routes(&self) -> impl Iterator<Item = (&str, &RouteEntry)> {
        self.routes
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Read-only snapshot of the route table for dispatch.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(Arc::clone(&self.routes), self.options)
    }

    pub async fn handle(
        &self,
        batch: &Value,
        context: &Context,
    ) -> Result<Vec<ResultItem>, BatchError> {
        self.dispatcher().handle(batch, context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::handler::sync_handler;

    fn terminal() -> Handler {
        sync_handler(|_, _| Ok(Some(json!({ "ok": true }))))
    }

    fn noop() -> Handler {
        sync_handler(|_, _| Ok(None))
    }

    #[test]
    fn test_register_validates_and_rejects_duplicates() {
        let mut router = Router::new();
        router.register("math", terminal()).unwrap();

        assert_eq!(
            router.register("math", terminal()).unwrap_err(),
            RouterError::Duplicate("math".into())
        );
        assert!(matches!(
            router.register("a", terminal()).unwrap_err(),
            RouterError::InvalidName { reason: RouteNameError::TooShort, .. }
        ));
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_middleware_is_snapshotted_at_registration() {
        let mut router = Router::new();
        router.add_before(noop());
        router.register("first", terminal()).unwrap();
        router.add_before(noop()).add_after(noop());
        router.register("second", terminal()).unwrap();

        let first = router.get("first").unwrap().chain();
        assert_eq!((first.before().len(), first.after().len()), (1, 0));
        let second = router.get("second").unwrap().chain();
        assert_eq!((second.before().len(), second.after().len()), (2, 1));
    }

    #[test]
    fn test_route_specific_chain() {
        let mut router = Router::new();
        router.add_before(noop());
        let chain = HandlerChain::from_handlers(vec![noop(), terminal()]).unwrap();
        router.register("chained", chain).unwrap();
        assert_eq!(router.get("chained").unwrap().chain().before().len(), 2);
    }

    #[test]
    fn test_describe_updates_metadata() {
        let mut router = Router::new();
        router.register("math", terminal()).unwrap();
        router
            .describe(
                "math",
                &json!({
                    "description": "Arithmetic",
                    "parameters": { "type": "object" },
                    "timeout": 250,
                    "visible": false,
                    "validate": true
                }),
            )
            .unwrap();

        let entry = router.get("math").unwrap();
        assert_eq!(entry.description(), Some("Arithmetic"));
        assert_eq!(entry.parameters(), Some(&json!({ "type": "object" })));
        assert_eq!(entry.timeout_ms(), Some(250));
        assert!(!entry.is_visible());
        assert!(entry.validate());

        // Partial update keeps earlier fields
        router.describe("math", &json!({ "visible": true })).unwrap();
        let entry = router.get("math").unwrap();
        assert!(entry.is_visible());
        assert_eq!(entry.description(), Some("Arithmetic"));
    }

    #[test]
    fn test_describe_rejections() {
        let mut router = Router::new();
        router.register("math", terminal()).unwrap();

        assert_eq!(
            router.describe("nope", &json!({})).unwrap_err(),
            RouterError::NotFound("nope".into())
        );
        assert_eq!(
            router.describe("math", &json!("text")).unwrap_err(),
            RouterError::ConfigNotObject
        );
        for bad in [json!({ "timeout": 0 }), json!({ "timeout": -5 }), json!({ "timeout": 1.5 }), json!({ "timeout": "5" })] {
            assert!(matches!(
                router.describe("math", &bad).unwrap_err(),
                RouterError::InvalidConfig { field: "timeout", .. }
            ));
        }
        assert!(matches!(
            router.describe("math", &json!({ "description": "ok", "visible": "yes" })).unwrap_err(),
            RouterError::InvalidConfig { field: "visible", .. }
        ));
        // Rejected update left nothing behind
        assert_eq!(router.get("math").unwrap().description(), None);
    }

    #[test]
    fn test_merge_wraps_and_keeps_timeouts() {
        let mut other = Router::new();
        other.add_before(noop());
        other.register("users", terminal()).unwrap();
        other.register("posts", terminal()).unwrap();
        other.describe("posts", &json!({ "timeout": 100 })).unwrap();

        let mut router = Router::new();
        router.add_before(noop()).add_after(noop());
        router.merge(&other).unwrap();

        let users = router.get("users").unwrap();
        assert_eq!((users.chain().before().len(), users.chain().after().len()), (2, 1));
        assert_eq!(users.timeout_ms(), None);
        assert_eq!(router.get("posts").unwrap().timeout_ms(), Some(100));
    }

    #[test]
    fn test_merge_rejects_collisions_atomically() {
        let mut other = Router::new();
        other.register("aa", terminal()).unwrap();
        other.register("zz", terminal()).unwrap();

        let mut router = Router::new();
        router.register("zz", terminal()).unwrap();

        assert_eq!(router.merge(&other).unwrap_err(), RouterError::Duplicate("zz".into()));
        assert!(router.get("aa").is_none());
        assert_eq!(router.merge(&Router::new()).unwrap_err(), RouterError::EmptySource);
    }

    #[test]
    fn test_namespace_prefixes_names() {
        let mut other = Router::new();
        other.register("list", terminal()).unwrap();
        other.register("get", terminal()).unwrap();

        let mut router = Router::new();
        router.namespace("users", &other).unwrap();
        assert!(router.get("users/list").is_some());
        assert!(router.get("users/get").is_some());

        assert_eq!(
            router.namespace("users", &other).unwrap_err(),
            RouterError::Duplicate("users/get".into())
        );
        assert!(matches!(
            router.namespace("-bad", &other).unwrap_err(),
            RouterError::InvalidName { .. }
        ));
        assert_eq!(
            router.namespace("posts", &Router::new()).unwrap_err(),
            RouterError::EmptySource
        );

        // A one-character first segment is fine on its own but not once nested.
        let mut short = Router::new();
        short.register("a/bc", terminal()).unwrap();
        short.register("zz", terminal()).unwrap();
        assert_eq!(
            router.namespace("teams", &short).unwrap_err(),
            RouterError::InvalidName {
                name: "teams/a/bc".into(),
                reason: RouteNameError::SegmentTooShort,
            }
        );
        assert!(router.get("teams/zz").is_none());
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn test_summary_lists_metadata() {
        let mut router = Router::new();
        router.register("math", terminal()).unwrap();
        router
            .describe("math", &json!({ "description": "Arithmetic", "timeout": 100 }))
            .unwrap();
        assert_eq!(
            router.get("math").unwrap().summary("math"),
            json!({ "name": "math", "description": "Arithmetic", "timeout": 100, "validate": false })
        );
    }
}
