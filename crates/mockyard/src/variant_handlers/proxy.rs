//! `proxy` kind: forwards the request to another host.

use super::{
    HandlerError, MockResponse, RequestHandler, VariantContext, VariantHandler,
    VariantHandlerKind,
};
use crate::mock::MockRequest;
use async_trait::async_trait;
use http_body_util::Full;
use hyper::header::{HeaderName, CONNECTION, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use hyper::{HeaderMap, Response};
use mockyard_schema::Value;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

/// Shared HTTP client for proxy variants
static HTTP_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

fn get_http_client() -> &'static reqwest::Client {
    HTTP_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_default()
    })
}

/// Headers that describe a single connection and are never forwarded.
const HOP_BY_HOP: [&str; 6] = [
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "upgrade",
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    name == CONNECTION
        || name == TRANSFER_ENCODING
        || HOP_BY_HOP.contains(&name.as_str())
}

pub struct ProxyKind;

impl VariantHandlerKind for ProxyKind {
    fn id(&self) -> &str {
        "proxy"
    }

    fn options_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "host": {"type": "string", "minLength": 1},
                "options": {
                    "type": "object",
                    "properties": {
                        "stripPrefix": {"type": "boolean"},
                        "timeoutMs": {"type": "integer", "minimum": 1}
                    },
                    "additionalProperties": false
                }
            },
            "required": ["host"],
            "additionalProperties": false
        }))
    }

    fn build(
        &self,
        options: &Value,
        _context: &VariantContext,
    ) -> Result<VariantHandler, HandlerError> {
        let host = options
            .get("host")
            .and_then(Value::as_str)
            .ok_or_else(|| HandlerError::Options("host must be a string".to_string()))?;
        let base = reqwest::Url::parse(host)
            .map_err(|e| HandlerError::Options(format!("invalid host '{host}': {e}")))?;
        let extra = options.get("options");
        let strip_prefix = extra
            .and_then(|o| o.get("stripPrefix"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let timeout = extra
            .and_then(|o| o.get("timeoutMs"))
            .and_then(Value::as_u64)
            .map(Duration::from_millis);
        Ok(VariantHandler::request(ProxyHandler {
            host: base.as_str().trim_end_matches('/').to_string(),
            strip_prefix,
            timeout,
        }))
    }
}

struct ProxyHandler {
    host: String,
    /// Forward only the `*` capture of the route url instead of the full path.
    strip_prefix: bool,
    timeout: Option<Duration>,
}

impl ProxyHandler {
    fn target_url(&self, request: &MockRequest) -> String {
        let path = match (self.strip_prefix, request.params.get("0")) {
            (true, Some(rest)) => format!("/{}", rest.trim_start_matches('/')),
            (true, None) => "/".to_string(),
            (false, _) => request.path().to_string(),
        };
        let query = request.query().map(|q| format!("?{q}")).unwrap_or_default();
        format!("{}{}{}", self.host, path, query)
    }
}

#[async_trait]
impl RequestHandler for ProxyHandler {
    async fn handle(&self, request: &MockRequest) -> Result<Option<MockResponse>, HandlerError> {
        let target_url = self.target_url(request);
        debug!("Proxy request to: {}", target_url);

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            if name != HOST && name != CONTENT_LENGTH && !is_hop_by_hop(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        let mut upstream = get_http_client()
            .request(request.method.clone(), &target_url)
            .headers(headers)
            .body(request.body.clone());
        if let Some(timeout) = self.timeout {
            upstream = upstream.timeout(timeout);
        }

        let response = upstream
            .send()
            .await
            .map_err(|e| HandlerError::Upstream(format!("{target_url}: {e}")))?;
        let status = response.status();
        let upstream_headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| HandlerError::Upstream(format!("{target_url}: {e}")))?;

        let mut builder = Response::builder().status(status);
        for (name, value) in &upstream_headers {
            if name != CONTENT_LENGTH && !is_hop_by_hop(name) {
                builder = builder.header(name, value);
            }
        }
        builder
            .body(Full::new(body))
            .map(Some)
            .map_err(|e| HandlerError::Response(e.to_string()))
    }
}
