//! Route dispatch logic for the Admin API.

use crate::admin_api::handlers::{config, mock, system};
use crate::admin_api::server::AdminState;
use crate::admin_api::types::{get_base_url, not_found};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use std::sync::Arc;
use tracing::debug;

/// Parsed route for endpoints under `/api/mock/`
#[derive(Debug, PartialEq)]
enum MockResource {
    /// /api/mock/routes
    Routes,
    /// /api/mock/routes/:id
    Route(String),
    /// /api/mock/variants
    Variants,
    /// /api/mock/variants/:id
    Variant(String),
    /// /api/mock/collections
    Collections,
    /// /api/mock/collections/:id
    Collection(String),
    /// /api/mock/custom-route-variants
    Overrides,
    /// /api/mock/reload
    Reload,
}

impl MockResource {
    /// Parse route from path segments after `/api/mock/`
    fn parse(segments: &[&str]) -> Option<Self> {
        match segments {
            ["routes"] => Some(MockResource::Routes),
            ["routes", id] => Some(MockResource::Route(decode(id))),
            ["variants"] => Some(MockResource::Variants),
            ["variants", id] => Some(MockResource::Variant(decode(id))),
            ["collections"] => Some(MockResource::Collections),
            ["collections", id] => Some(MockResource::Collection(decode(id))),
            ["custom-route-variants"] => Some(MockResource::Overrides),
            ["reload"] => Some(MockResource::Reload),
            _ => None,
        }
    }
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

/// Main request router
pub async fn route_request(
    req: Request<Incoming>,
    state: Arc<AdminState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Admin API: {} {}", method, path);

    Ok(route_by_path(&method, &path, req, state).await)
}

/// Route based on path
async fn route_by_path(
    method: &Method,
    path: &str,
    req: Request<Incoming>,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    let path = match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    };

    match (method, path) {
        (&Method::GET, "/") => return system::handle_root(&get_base_url(&req)),
        (&Method::GET, "/health") => return system::handle_health(),
        (&Method::GET, "/metrics") => return system::handle_metrics(),
        (&Method::GET, "/api/alerts") => return system::handle_alerts(&state),
        (&Method::GET, "/api/config") => return config::handle_get(&state),
        (&Method::PATCH, "/api/config") => return config::handle_patch(req, &state).await,
        _ => {}
    }

    let Some(rest) = path.strip_prefix("/api/mock/") else {
        return not_found();
    };
    let segments: Vec<&str> = rest.split('/').collect();
    let Some(resource) = MockResource::parse(&segments) else {
        return not_found();
    };

    match (method, resource) {
        (&Method::GET, MockResource::Routes) => mock::handle_list_routes(&state),
        (&Method::GET, MockResource::Route(id)) => mock::handle_get_route(&state, &id),
        (&Method::GET, MockResource::Variants) => mock::handle_list_variants(&state),
        (&Method::GET, MockResource::Variant(id)) => mock::handle_get_variant(&state, &id),
        (&Method::GET, MockResource::Collections) => mock::handle_list_collections(&state),
        (&Method::GET, MockResource::Collection(id)) => mock::handle_get_collection(&state, &id),

        (&Method::GET, MockResource::Overrides) => mock::handle_list_overrides(&state),
        (&Method::POST, MockResource::Overrides) => mock::handle_set_override(req, &state).await,
        (&Method::DELETE, MockResource::Overrides) => mock::handle_restore_overrides(&state),

        (&Method::POST, MockResource::Reload) => mock::handle_reload(&state).await,

        _ => not_found(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_resource_parse() {
        assert_eq!(MockResource::parse(&["routes"]), Some(MockResource::Routes));
        assert_eq!(
            MockResource::parse(&["routes", "get-users"]),
            Some(MockResource::Route("get-users".to_string()))
        );
        assert_eq!(
            MockResource::parse(&["variants", "get-users%3Asuccess"]),
            Some(MockResource::Variant("get-users:success".to_string()))
        );
        assert_eq!(
            MockResource::parse(&["collections", "base"]),
            Some(MockResource::Collection("base".to_string()))
        );
        assert_eq!(
            MockResource::parse(&["custom-route-variants"]),
            Some(MockResource::Overrides)
        );
        assert_eq!(MockResource::parse(&["reload"]), Some(MockResource::Reload));

        // Invalid routes
        assert!(MockResource::parse(&["unknown"]).is_none());
        assert!(MockResource::parse(&["routes", "a", "b"]).is_none());
        assert!(MockResource::parse(&[]).is_none());
    }
}
