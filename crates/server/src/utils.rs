use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use catalog::CatalogError;
use tracing::warn;

use crate::state::{ApiError, ErrorResponse};

pub fn json_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn json_error_response(status: StatusCode, message: impl Into<String>) -> Response {
    json_error(status, message).into_response()
}

/// Client mistakes become 4xx; store failures become 500.
pub fn catalog_error(err: CatalogError) -> ApiError {
    match err {
        CatalogError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "song not found"),
        CatalogError::InvalidArgument(message) => json_error(StatusCode::BAD_REQUEST, message),
        err => {
            warn!("Catalog store failure: {}", err);
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("catalog error: {}", err),
            )
        }
    }
}

pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

pub fn clamp_limit(requested: Option<usize>, default: usize, max: usize) -> usize {
    requested.unwrap_or(default).clamp(1, max.max(1))
}
