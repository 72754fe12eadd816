//! `json` kind: fixed status and JSON body.

use super::{
    headers_schema, parse_headers, parse_status, respond, status_schema, HandlerError,
    MockResponse, RequestHandler, VariantContext, VariantHandler, VariantHandlerKind,
};
use crate::mock::MockRequest;
use async_trait::async_trait;
use hyper::{HeaderMap, StatusCode};
use mockyard_schema::Value;

const CONTENT_TYPE: &str = "application/json; charset=utf-8";

pub struct JsonKind;

impl VariantHandlerKind for JsonKind {
    fn id(&self) -> &str {
        "json"
    }

    fn options_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "status": status_schema(),
                "body": {"type": ["object", "array"]},
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
        let body = options.get("body").map(Value::to_json).unwrap_or_default();
        let encoded = serde_json::to_vec(&body)
            .map_err(|e| HandlerError::Options(format!("body is not serializable: {e}")))?;
        Ok(VariantHandler::request(JsonHandler {
            status: parse_status(options)?,
            headers: parse_headers(options)?,
            body,
            encoded,
        }))
    }
}

struct JsonHandler {
    status: StatusCode,
    headers: HeaderMap,
    body: serde_json::Value,
    encoded: Vec<u8>,
}

#[async_trait]
impl RequestHandler for JsonHandler {
    async fn handle(&self, _request: &MockRequest) -> Result<Option<MockResponse>, HandlerError> {
        respond(self.status, Some(CONTENT_TYPE), &self.headers, self.encoded.clone()).map(Some)
    }

    fn preview(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "status": self.status.as_u16(),
            "body": self.body
        }))
    }
}
