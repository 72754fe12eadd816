//! `text` kind: fixed status and plain text body.

use super::{
    headers_schema, parse_headers, parse_status, respond, status_schema, HandlerError,
    MockResponse, RequestHandler, VariantContext, VariantHandler, VariantHandlerKind,
};
use crate::mock::MockRequest;
use async_trait::async_trait;
use hyper::{HeaderMap, StatusCode};
use mockyard_schema::Value;

const CONTENT_TYPE: &str = "text/plain; charset=utf-8";

pub struct TextKind;

impl VariantHandlerKind for TextKind {
    fn id(&self) -> &str {
        "text"
    }

    fn options_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "status": status_schema(),
                "body": {"type": "string"},
                "headers": headers_schema()
            },
            "required": ["status", "body"],
            "additionalProperties": false
        }))
    }

    fn build(
        &self,
        options: &Value,
        _context: &VariantContext,
    ) -> Result<VariantHandler, HandlerError> {
        Ok(VariantHandler::request(TextHandler {
            status: parse_status(options)?,
            headers: parse_headers(options)?,
            body: options
                .get("body")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }))
    }
}

struct TextHandler {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

#[async_trait]
impl RequestHandler for TextHandler {
    async fn handle(&self, _request: &MockRequest) -> Result<Option<MockResponse>, HandlerError> {
        respond(self.status, Some(CONTENT_TYPE), &self.headers, self.body.clone()).map(Some)
    }

    fn preview(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "status": self.status.as_u16(),
            "body": self.body
        }))
    }
}
