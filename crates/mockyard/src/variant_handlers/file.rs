//! `file` kind: answers with the contents of one file.

use super::{
    content_type, headers_schema, parse_headers, parse_status, respond, status_schema,
    HandlerError, MockResponse, RequestHandler, VariantContext, VariantHandler,
    VariantHandlerKind,
};
use crate::mock::MockRequest;
use async_trait::async_trait;
use hyper::{HeaderMap, StatusCode};
use mockyard_schema::Value;
use std::path::PathBuf;

pub struct FileKind;

impl VariantHandlerKind for FileKind {
    fn id(&self) -> &str {
        "file"
    }

    fn options_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "minLength": 1},
                "status": status_schema(),
                "headers": headers_schema()
            },
            "required": ["path", "status"],
            "additionalProperties": false
        }))
    }

    fn build(
        &self,
        options: &Value,
        _context: &VariantContext,
    ) -> Result<VariantHandler, HandlerError> {
        let path = options
            .get("path")
            .and_then(Value::as_str)
            .map(PathBuf::from)
            .ok_or_else(|| HandlerError::Options("path must be a string".to_string()))?;
        Ok(VariantHandler::request(FileHandler {
            path,
            status: parse_status(options)?,
            headers: parse_headers(options)?,
        }))
    }
}

struct FileHandler {
    path: PathBuf,
    status: StatusCode,
    headers: HeaderMap,
}

#[async_trait]
impl RequestHandler for FileHandler {
    /// The file is read on every request so edits show up without a reload.
    async fn handle(&self, _request: &MockRequest) -> Result<Option<MockResponse>, HandlerError> {
        let contents = tokio::fs::read(&self.path).await?;
        respond(
            self.status,
            Some(content_type::for_path(&self.path)),
            &self.headers,
            contents,
        )
        .map(Some)
    }

    fn preview(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({"status": self.status.as_u16()}))
    }
}
