//! Admin API request handlers.

pub mod config;
pub mod mock;
pub mod system;

use crate::admin_api::types::error_response;
use crate::mock::MockError;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

/// Map an engine error to an admin error response.
pub(crate) fn mock_error_response(error: &MockError) -> Response<Full<Bytes>> {
    let status = match error {
        MockError::CollectionNotFound(_) | MockError::VariantNotFound(_) => StatusCode::NOT_FOUND,
        MockError::InvalidDefinitions { .. } => StatusCode::BAD_REQUEST,
        MockError::Schema(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, &error.to_string())
}
