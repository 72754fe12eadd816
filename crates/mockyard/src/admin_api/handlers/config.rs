//! Runtime settings handlers.

use super::mock_error_response;
use crate::admin_api::server::AdminState;
use crate::admin_api::types::*;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use tracing::info;

fn current_config(state: &AdminState) -> serde_json::Value {
    let options = state.mock.options();
    serde_json::json!({
        "mock": {
            "collections": {
                "selected": state.mock.selected_collection().or(options.selected_collection)
            },
            "routes": {"delay": options.delay},
            "strict": options.strict,
            "variantHandlers": state.mock.handler_kinds()
        },
        "files": state.loader.as_ref().map(|loader| serde_json::json!({
            "path": loader.path().display().to_string()
        }))
    })
}

/// GET /api/config
pub fn handle_get(state: &AdminState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &current_config(state))
}

/// PATCH /api/config
///
/// The collection is selected first, so an unknown id leaves every setting
/// untouched.
pub async fn handle_patch(req: Request<Incoming>, state: &AdminState) -> Response<Full<Bytes>> {
    let patch: ConfigPatch = match parse_json_body(req).await {
        Ok(patch) => patch,
        Err(response) => return response,
    };

    if let Some(id) = &patch.mock.collections.selected {
        if let Err(e) = state.mock.select_collection(id) {
            return mock_error_response(&e);
        }
    }
    if let Some(delay) = patch.mock.routes.delay {
        state.mock.set_delay(delay);
        info!(delay_ms = delay, "Global delay changed");
    }

    json_response(StatusCode::OK, &current_config(state))
}
