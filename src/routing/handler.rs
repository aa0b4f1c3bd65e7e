//! Handler abstraction and handler chains.
//!
//! Every element of a chain has the same shape: it receives the call
//! parameters and a mutable borrow of the call's context, and may suspend.
//! Synchronous closures are wrapped into an already-resolved future so the
//! pipeline treats both kinds uniformly.

use std::fmt;
use std::sync::Arc;

use futures_util::future::{self, BoxFuture};
use serde_json::Value;

use crate::protocol::context::Context;
use crate::protocol::error::HandlerError;

/// What a chain element yields. Middleware and afterware return `Ok(None)`;
/// the terminal handler returns `Ok(Some(object))`.
pub type HandlerResult = Result<Option<Value>, HandlerError>;

pub trait RouteHandler: Send + Sync {
    fn call<'a>(&'a self, params: &'a Value, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult>;
}

pub type Handler = Arc<dyn RouteHandler>;

struct AsyncFn<F>(F);

impl<F> RouteHandler for AsyncFn<F>
where
    F: for<'a> Fn(&'a Value, &'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync,
{
    fn call<'a>(&'a self, params: &'a Value, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        (self.0)(params, ctx)
    }
}

struct SyncFn<F>(F);

impl<F> RouteHandler for SyncFn<F>
where
    F: Fn(&Value, &mut Context) -> HandlerResult + Send + Sync,
{
    fn call<'a>(&'a self, params: &'a Value, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(future::ready((self.0)(params, ctx)))
    }
}

/// Wrap an async closure: `handler(|params, ctx| Box::pin(async move { ... }))`.
pub fn handler<F>(f: F) -> Handler
where
    F: for<'a> Fn(&'a Value, &'a mut Context) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    Arc::new(AsyncFn(f))
}

/// Wrap a synchronous closure.
pub fn sync_handler<F>(f: F) -> Handler
where
    F: Fn(&Value, &mut Context) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(SyncFn(f))
}

/// Middleware, exactly one terminal handler, then afterware.
#[derive(Clone)]
pub struct HandlerChain {
    before: Vec<Handler>,
    terminal: Handler,
    after: Vec<Handler>,
}

#[allow(clippy::len_without_is_empty)]
impl HandlerChain {
    pub fn new(terminal: Handler) -> Self {
        Self {
            before: Vec::new(),
            terminal,
            after: Vec::new(),
        }
    }

    /// The last handler is the terminal one; everything before it is
    /// route-specific middleware. Returns `None` for an empty list.
    pub fn from_handlers(mut handlers: Vec<Handler>) -> Option<Self> {
        let terminal = handlers.pop()?;
        Some(Self {
            before: handlers,
            terminal,
            after: Vec::new(),
        })
    }

    pub fn with_after(mut self, afterware: Handler) -> Self {
        self.after.push(afterware);
        self
    }

    pub fn before(&self) -> &[Handler] {
        &self.before
    }

    pub fn terminal(&self) -> &Handler {
        &self.terminal
    }

    pub fn after(&self) -> &[Handler] {
        &self.after
    }

    /// Number of handlers, terminal included.
    pub fn len(&self) -> usize {
        self.before.len() + 1 + self.after.len()
    }

    /// `[*before, *self, *after]`
    pub(crate) fn wrap(&self, before: &[Handler], after: &[Handler]) -> Self {
        Self {
            before: before.iter().chain(&self.before).cloned().collect(),
            terminal: Arc::clone(&self.terminal),
            after: self.after.iter().chain(after).cloned().collect(),
        }
    }
}

impl From<Handler> for HandlerChain {
    fn from(terminal: Handler) -> Self {
        Self::new(terminal)
    }
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish()
    }
}
