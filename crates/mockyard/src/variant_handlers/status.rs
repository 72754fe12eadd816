//! `status` kind: empty body with a fixed status.

use super::{
    headers_schema, parse_headers, parse_status, respond, status_schema, HandlerError,
    MockResponse, RequestHandler, VariantContext, VariantHandler, VariantHandlerKind,
};
use crate::mock::MockRequest;
use async_trait::async_trait;
use bytes::Bytes;
use hyper::{HeaderMap, StatusCode};
use mockyard_schema::Value;

pub struct StatusKind;

impl VariantHandlerKind for StatusKind {
    fn id(&self) -> &str {
        "status"
    }

    fn options_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "status": status_schema(),
                "headers": headers_schema()
            },
            "required": ["status"],
            "additionalProperties": false
        }))
    }

    fn build(
        &self,
        options: &Value,
        _context: &VariantContext,
    ) -> Result<VariantHandler, HandlerError> {
        Ok(VariantHandler::request(StatusHandler {
            status: parse_status(options)?,
            headers: parse_headers(options)?,
        }))
    }
}

struct StatusHandler {
    status: StatusCode,
    headers: HeaderMap,
}

#[async_trait]
impl RequestHandler for StatusHandler {
    async fn handle(&self, _request: &MockRequest) -> Result<Option<MockResponse>, HandlerError> {
        respond(self.status, None, &self.headers, Bytes::new()).map(Some)
    }

    fn preview(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({"status": self.status.as_u16()}))
    }
}
