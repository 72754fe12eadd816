//! System handlers: root links, health, metrics and alerts.

use crate::admin_api::server::AdminState;
use crate::admin_api::types::*;
use crate::metrics::collect_metrics;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

/// GET / - Root endpoint
pub fn handle_root(base_url: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "_links": {
            "routes": {"href": format!("{}/api/mock/routes", base_url)},
            "variants": {"href": format!("{}/api/mock/variants", base_url)},
            "collections": {"href": format!("{}/api/mock/collections", base_url)},
            "customRouteVariants": {"href": format!("{}/api/mock/custom-route-variants", base_url)},
            "config": {"href": format!("{}/api/config", base_url)},
            "alerts": {"href": format!("{}/api/alerts", base_url)}
        }
    });
    json_response(StatusCode::OK, &body)
}

/// GET /health - Health check
pub fn handle_health() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &serde_json::json!({"status": "ok"}))
}

/// GET /metrics - Prometheus metrics
pub fn handle_metrics() -> Response<Full<Bytes>> {
    build_response_with_headers(
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        collect_metrics(),
    )
}

/// GET /api/alerts
pub fn handle_alerts(state: &AdminState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &state.alerts.list())
}
