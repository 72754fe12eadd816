//! `middleware` kind: runs a native function supplied through the Rust API.
//!
//! Files cannot express functions, so variants of this kind are built by
//! passing a [`Value::Function`] created with [`middleware`] as the
//! `middleware` option.

use super::{
    HandlerError, MockResponse, RequestHandler, VariantContext, VariantHandler,
    VariantHandlerKind,
};
use crate::mock::MockRequest;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use mockyard_schema::{Function, Value};
use std::future::Future;
use std::sync::Arc;

type MiddlewareFn =
    dyn Fn(MockRequest) -> BoxFuture<'static, Result<Option<MockResponse>, HandlerError>>
        + Send
        + Sync;

/// Callable stored inside a middleware [`Function`].
#[derive(Clone)]
struct Middleware(Arc<MiddlewareFn>);

/// Wrap an async function into a value usable as the `middleware` option.
///
/// The function receives an owned copy of the request. Returning `Ok(None)`
/// passes the request on unhandled.
pub fn middleware<F, Fut>(name: impl Into<String>, f: F) -> Value
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<MockResponse>, HandlerError>> + Send + 'static,
{
    let callable: Arc<MiddlewareFn> = Arc::new(move |request: MockRequest| f(request).boxed());
    Value::Function(Function::new(name, Middleware(callable)))
}

pub struct MiddlewareKind;

impl VariantHandlerKind for MiddlewareKind {
    fn id(&self) -> &str {
        "middleware"
    }

    fn options_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "middleware": {"instanceof": "Function"}
            },
            "required": ["middleware"],
            "additionalProperties": false
        }))
    }

    fn build(
        &self,
        options: &Value,
        context: &VariantContext,
    ) -> Result<VariantHandler, HandlerError> {
        let function = options
            .get("middleware")
            .and_then(Value::as_function)
            .ok_or_else(|| HandlerError::Options("middleware must be a function".to_string()))?;
        let middleware = function.downcast::<Middleware>().ok_or_else(|| {
            HandlerError::Options(format!(
                "function '{}' of variant {}:{} was not created with mockyard::variant_handlers::middleware",
                function.name(),
                context.route_id,
                context.variant_id
            ))
        })?;
        Ok(VariantHandler::request(MiddlewareHandler {
            middleware: middleware.clone(),
        }))
    }
}

struct MiddlewareHandler {
    middleware: Middleware,
}

#[async_trait]
impl RequestHandler for MiddlewareHandler {
    async fn handle(&self, request: &MockRequest) -> Result<Option<MockResponse>, HandlerError> {
        (self.middleware.0)(request.clone()).await
    }
}
