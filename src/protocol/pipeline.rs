//! Handler invocation pipeline.
//!
//! Runs `middleware* → terminal → afterware*` in order against one call's
//! context. Only the terminal handler produces the result, and it must be a
//! JSON object. Any other element returning a value is a programming error.

use serde_json::{Map, Value};

use crate::protocol::context::Context;
use crate::protocol::error::{CallError, MIDDLEWARE_RETURNED_VALUE, RESULT_NOT_OBJECT};
use crate::routing::handler::HandlerChain;

pub async fn run_chain(
    chain: &HandlerChain,
    params: &Value,
    ctx: &mut Context,
) -> Result<Map<String, Value>, CallError> {
    for middleware in chain.before() {
        expect_nothing(middleware.call(params, ctx).await?)?;
    }

    let result = match chain.terminal().call(params, ctx).await? {
        Some(Value::Object(result)) => result,
        _ => return Err(CallError::ResultShape(RESULT_NOT_OBJECT)),
    };

    for afterware in chain.after() {
        expect_nothing(afterware.call(params, ctx).await?)?;
    }

    Ok(result)
}

fn expect_nothing(returned: Option<Value>) -> Result<(), CallError> {
    match returned {
        None | Some(Value::Null) => Ok(()),
        Some(_) => Err(CallError::ResultShape(MIDDLEWARE_RETURNED_VALUE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::error::HandlerError;
    use crate::routing::handler::{handler, sync_handler, Handler};
    use serde_json::json;

    fn chain(handlers: Vec<Handler>) -> HandlerChain {
        HandlerChain::from_handlers(handlers).unwrap()
    }

    #[tokio::test]
    async fn test_middleware_mutates_context_for_terminal() {
        let auth = sync_handler(|_, ctx| {
            ctx.insert("user", "alice");
            Ok(None)
        });
        let whoami = handler(|_, ctx| {
            Box::pin(async move {
                tokio::task::yield_now().await;
                Ok(Some(json!({ "user": ctx.get("user").cloned() })))
            })
        });

        let mut ctx = Context::new();
        let result = run_chain(&chain(vec![auth, whoami]), &Value::Null, &mut ctx)
            .await
            .unwrap();
        assert_eq!(Value::Object(result), json!({ "user": "alice" }));
    }

    #[tokio::test]
    async fn test_afterware_runs_after_terminal() {
        let terminal = sync_handler(|_, ctx| {
            ctx.insert("order", json!(["terminal"]));
            Ok(Some(json!({ "ok": true })))
        });
        let audit = sync_handler(|_, ctx| {
            if let Some(Value::Array(order)) = ctx.get("order").cloned() {
                let mut order = order;
                order.push(json!("after"));
                ctx.insert("order", order);
            }
            Ok(None)
        });

        let mut ctx = Context::new();
        let c = HandlerChain::new(terminal).with_after(audit);
        run_chain(&c, &Value::Null, &mut ctx).await.unwrap();
        assert_eq!(ctx.get("order"), Some(&json!(["terminal", "after"])));
    }

    #[tokio::test]
    async fn test_middleware_returning_value_is_rejected() {
        let chatty = sync_handler(|_, _| Ok(Some(json!({ "oops": 1 }))));
        let terminal = sync_handler(|_, _| Ok(Some(json!({}))));

        let err = run_chain(&chain(vec![chatty, terminal]), &Value::Null, &mut Context::new())
            .await
            .unwrap_err();
        assert_eq!(err, CallError::ResultShape(MIDDLEWARE_RETURNED_VALUE));
    }

    #[tokio::test]
    async fn test_terminal_must_return_object() {
        for returned in [None, Some(json!([1, 2])), Some(json!("text"))] {
            let terminal = sync_handler(move |_, _| Ok(returned.clone()));
            let err = run_chain(&HandlerChain::new(terminal), &Value::Null, &mut Context::new())
                .await
                .unwrap_err();
            assert_eq!(err, CallError::ResultShape(RESULT_NOT_OBJECT));
        }
    }

    #[tokio::test]
    async fn test_middleware_error_stops_chain() {
        let deny = sync_handler(|_, _| Err(HandlerError::new("Unauthorized").with_status(401)));
        let terminal = sync_handler(|_, ctx| {
            ctx.insert("reached", true);
            Ok(Some(json!({})))
        });

        let mut ctx = Context::new();
        let err = run_chain(&chain(vec![deny, terminal]), &Value::Null, &mut ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_error_info().status, 401);
        assert!(!ctx.contains_key("reached"));
    }
}
