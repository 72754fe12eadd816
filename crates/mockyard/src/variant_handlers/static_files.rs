//! `static` kind: serves a directory tree below the route's mount point.

use super::{
    content_type, headers_schema, parse_headers, respond, HandlerError, MockResponse,
    SubRouter, VariantContext, VariantHandler, VariantHandlerKind,
};
use crate::mock::MockRequest;
use async_trait::async_trait;
use bytes::Bytes;
use hyper::{HeaderMap, Method, StatusCode};
use mockyard_schema::Value;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

const INDEX_FILE: &str = "index.html";

pub struct StaticKind;

impl VariantHandlerKind for StaticKind {
    fn id(&self) -> &str {
        "static"
    }

    fn options_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "minLength": 1},
                "headers": headers_schema(),
                "options": {
                    "type": "object",
                    "properties": {
                        "index": {"type": "boolean"}
                    }
                }
            },
            "required": ["path"],
            "additionalProperties": false
        }))
    }

    fn build(
        &self,
        options: &Value,
        _context: &VariantContext,
    ) -> Result<VariantHandler, HandlerError> {
        let root = options
            .get("path")
            .and_then(Value::as_str)
            .map(PathBuf::from)
            .ok_or_else(|| HandlerError::Options("path must be a string".to_string()))?;
        let index = options
            .get("options")
            .and_then(|o| o.get("index"))
            .and_then(Value::as_bool)
            .unwrap_or(true);
        Ok(VariantHandler::router(StaticRouter {
            root,
            index,
            headers: parse_headers(options)?,
        }))
    }
}

struct StaticRouter {
    root: PathBuf,
    index: bool,
    headers: HeaderMap,
}

impl StaticRouter {
    /// Map `sub_path` to a file below the root, refusing anything that
    /// would escape it.
    fn resolve(&self, sub_path: &str) -> Option<PathBuf> {
        let decoded = urlencoding::decode(sub_path).ok()?;
        let relative = Path::new(decoded.trim_start_matches('/'));
        let mut target = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => target.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(target)
    }

    async fn read(&self, target: &Path) -> Result<Option<(PathBuf, Vec<u8>)>, HandlerError> {
        let metadata = match tokio::fs::metadata(target).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let file = if metadata.is_dir() {
            if !self.index {
                return Ok(None);
            }
            let index = target.join(INDEX_FILE);
            if !tokio::fs::try_exists(&index).await? {
                return Ok(None);
            }
            index
        } else {
            target.to_path_buf()
        };
        let contents = tokio::fs::read(&file).await?;
        Ok(Some((file, contents)))
    }
}

#[async_trait]
impl SubRouter for StaticRouter {
    async fn route(
        &self,
        request: &MockRequest,
        sub_path: &str,
    ) -> Result<Option<MockResponse>, HandlerError> {
        if request.method != Method::GET && request.method != Method::HEAD {
            return Ok(None);
        }
        let Some(target) = self.resolve(sub_path) else {
            debug!(path = sub_path, "Refusing static path outside of root");
            return Ok(None);
        };
        let Some((file, contents)) = self.read(&target).await? else {
            return Ok(None);
        };
        let body = if request.method == Method::HEAD {
            Bytes::new()
        } else {
            Bytes::from(contents)
        };
        respond(
            StatusCode::OK,
            Some(content_type::for_path(&file)),
            &self.headers,
            body,
        )
        .map(Some)
    }
}
