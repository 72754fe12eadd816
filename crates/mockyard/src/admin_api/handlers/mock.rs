//! Route, variant, collection and override handlers.

use super::mock_error_response;
use crate::admin_api::server::AdminState;
use crate::admin_api::types::*;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use tracing::{error, info};

/// GET /api/mock/routes
pub fn handle_list_routes(state: &AdminState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &state.mock.list_routes())
}

/// GET /api/mock/routes/:id
pub fn handle_get_route(state: &AdminState, id: &str) -> Response<Full<Bytes>> {
    match state.mock.route(id) {
        Some(route) => json_response(StatusCode::OK, &route),
        None => error_response(
            StatusCode::NOT_FOUND,
            &format!("Route \"{id}\" was not found"),
        ),
    }
}

/// GET /api/mock/variants
pub fn handle_list_variants(state: &AdminState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &state.mock.list_variants())
}

/// GET /api/mock/variants/:id
pub fn handle_get_variant(state: &AdminState, id: &str) -> Response<Full<Bytes>> {
    match state.mock.variant(id) {
        Some(variant) => json_response(StatusCode::OK, &variant),
        None => error_response(
            StatusCode::NOT_FOUND,
            &format!("Route variant \"{id}\" was not found"),
        ),
    }
}

/// GET /api/mock/collections
pub fn handle_list_collections(state: &AdminState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &state.mock.list_collections())
}

/// GET /api/mock/collections/:id
pub fn handle_get_collection(state: &AdminState, id: &str) -> Response<Full<Bytes>> {
    match state.mock.collection(id) {
        Some(collection) => json_response(StatusCode::OK, &collection),
        None => error_response(
            StatusCode::NOT_FOUND,
            &format!("Collection \"{id}\" was not found"),
        ),
    }
}

/// GET /api/mock/custom-route-variants
pub fn handle_list_overrides(state: &AdminState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &state.mock.overrides())
}

/// POST /api/mock/custom-route-variants
pub async fn handle_set_override(
    req: Request<Incoming>,
    state: &AdminState,
) -> Response<Full<Bytes>> {
    let request: OverrideRequest = match parse_json_body(req).await {
        Ok(request) => request,
        Err(response) => return response,
    };

    match state.mock.set_override(&request.id) {
        Ok(()) => json_response(
            StatusCode::CREATED,
            &serde_json::json!({"id": request.id}),
        ),
        Err(e) => mock_error_response(&e),
    }
}

/// DELETE /api/mock/custom-route-variants
pub fn handle_restore_overrides(state: &AdminState) -> Response<Full<Bytes>> {
    state.mock.restore_overrides();
    json_response(StatusCode::OK, &state.mock.overrides())
}

/// POST /api/mock/reload - Re-read definition files
pub async fn handle_reload(state: &AdminState) -> Response<Full<Bytes>> {
    let Some(loader) = state.loader.clone() else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Definitions are not loaded from files",
        );
    };

    match tokio::task::spawn_blocking(move || loader.load()).await {
        Ok(Ok(summary)) => {
            info!("Definitions reloaded through the admin API");
            json_response(StatusCode::OK, &summary)
        }
        Ok(Err(e)) => mock_error_response(&e),
        Err(e) => {
            error!("Reload task failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Reload failed")
        }
    }
}
