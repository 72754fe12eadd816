//! Variant handler kinds.
//!
//! A handler kind turns the `options` of a variant definition into a handler
//! instance. Instances are built once per variant when definitions are loaded
//! and come in exactly one of two call shapes:
//!
//! - [`RequestHandler`]: answers a request directly (json, text, status,
//!   middleware, file, proxy)
//! - [`SubRouter`]: receives the request together with the path remaining
//!   after the route's mount point (static)
//!
//! ## Module Structure
//!
//! - `registry`: ordered set of available kinds
//! - `content_type`: extension based content type lookup
//! - one module per built-in kind

mod content_type;
mod file;
mod json;
mod middleware;
mod proxy;
pub mod registry;
mod static_files;
mod status;
mod text;

use crate::mock::MockRequest;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{HeaderMap, Response, StatusCode};
use mockyard_schema::Value;
use std::sync::Arc;

pub use file::FileKind;
pub use json::JsonKind;
pub use middleware::{middleware, MiddlewareKind};
pub use proxy::ProxyKind;
pub use registry::VariantHandlerRegistry;
pub use static_files::StaticKind;
pub use status::StatusKind;
pub use text::TextKind;

/// Response type produced by every handler.
pub type MockResponse = Response<Full<Bytes>>;

/// Errors raised by handlers, either when built or when invoked.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("middleware error: {0}")]
    Middleware(String),

    #[error("failed to build response: {0}")]
    Response(String),

    #[error("invalid options: {0}")]
    Options(String),
}

/// Where a handler instance is being built.
#[derive(Debug, Clone)]
pub struct VariantContext {
    pub route_id: String,
    pub variant_id: String,
}

/// Handler answering requests directly.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// `Ok(None)` passes the request on without an error.
    async fn handle(&self, request: &MockRequest) -> Result<Option<MockResponse>, HandlerError>;

    /// JSON-safe summary of the configured response.
    fn preview(&self) -> Option<serde_json::Value> {
        None
    }
}

/// Handler delegating to a nested routing tree.
#[async_trait]
pub trait SubRouter: Send + Sync {
    /// `sub_path` is the request path below the route's mount point and
    /// always starts with `/`.
    async fn route(
        &self,
        request: &MockRequest,
        sub_path: &str,
    ) -> Result<Option<MockResponse>, HandlerError>;

    fn preview(&self) -> Option<serde_json::Value> {
        None
    }
}

/// A built handler instance.
#[derive(Clone)]
pub enum VariantHandler {
    Request(Arc<dyn RequestHandler>),
    Router(Arc<dyn SubRouter>),
}

impl VariantHandler {
    pub fn request(handler: impl RequestHandler + 'static) -> Self {
        VariantHandler::Request(Arc::new(handler))
    }

    pub fn router(router: impl SubRouter + 'static) -> Self {
        VariantHandler::Router(Arc::new(router))
    }

    pub fn is_router(&self) -> bool {
        matches!(self, VariantHandler::Router(_))
    }

    pub fn preview(&self) -> Option<serde_json::Value> {
        match self {
            VariantHandler::Request(handler) => handler.preview(),
            VariantHandler::Router(router) => router.preview(),
        }
    }
}

impl std::fmt::Debug for VariantHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariantHandler::Request(_) => f.write_str("VariantHandler::Request"),
            VariantHandler::Router(_) => f.write_str("VariantHandler::Router"),
        }
    }
}

/// A registered handler kind.
pub trait VariantHandlerKind: Send + Sync {
    /// Value of the variant `type` field selecting this kind.
    fn id(&self) -> &str;

    /// JSON schema for the variant `options`. `None` accepts anything.
    fn options_schema(&self) -> Option<serde_json::Value> {
        None
    }

    fn build(&self, options: &Value, context: &VariantContext)
        -> Result<VariantHandler, HandlerError>;
}

/// Kinds shipped with mockyard, in registration order.
pub fn builtin_kinds() -> Vec<Arc<dyn VariantHandlerKind>> {
    vec![
        Arc::new(JsonKind),
        Arc::new(TextKind),
        Arc::new(StatusKind),
        Arc::new(MiddlewareKind),
        Arc::new(StaticKind),
        Arc::new(FileKind),
        Arc::new(ProxyKind),
    ]
}

/// Schema shared by kinds accepting a `headers` option.
pub(crate) fn headers_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "additionalProperties": {"type": "string"}
    })
}

/// Schema for an HTTP status option.
pub(crate) fn status_schema() -> serde_json::Value {
    serde_json::json!({"type": "integer", "minimum": 100})
}

/// Parse the `status` option.
pub(crate) fn parse_status(options: &Value) -> Result<StatusCode, HandlerError> {
    let code = options
        .get("status")
        .and_then(Value::as_u64)
        .ok_or_else(|| HandlerError::Options("status must be an integer".to_string()))?;
    u16::try_from(code)
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or_else(|| HandlerError::Options(format!("invalid status code {code}")))
}

/// Parse the optional `headers` option into a header map.
pub(crate) fn parse_headers(options: &Value) -> Result<HeaderMap, HandlerError> {
    let mut headers = HeaderMap::new();
    let Some(entries) = options.get("headers").and_then(Value::as_object) else {
        return Ok(headers);
    };
    for (name, value) in entries {
        let value = value
            .as_str()
            .ok_or_else(|| HandlerError::Options(format!("header '{name}' must be a string")))?;
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HandlerError::Options(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| HandlerError::Options(format!("invalid value for '{name}': {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Build a response. `content_type` is only applied when `headers` does not
/// already carry one.
pub(crate) fn respond(
    status: StatusCode,
    content_type: Option<&str>,
    headers: &HeaderMap,
    body: impl Into<Bytes>,
) -> Result<MockResponse, HandlerError> {
    let mut builder = Response::builder().status(status);
    if let Some(content_type) = content_type {
        if !headers.contains_key(CONTENT_TYPE) {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
    }
    for (name, value) in headers {
        builder = builder.header(name, value);
    }
    builder
        .body(Full::new(body.into()))
        .map_err(|e| HandlerError::Response(e.to_string()))
}
