//! Domain error to HTTP response translation
//!
//! The resolver and services never log or swallow errors; this boundary is
//! the single place they become client responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cadence_domain::CadenceError;
use serde_json::json;
use tracing::{error, warn};

/// Wrapper so domain errors can flow out of handlers with `?`.
#[derive(Debug)]
pub struct ApiError(pub CadenceError);

impl From<CadenceError> for ApiError {
    fn from(err: CadenceError) -> Self {
        Self(err)
    }
}

/// Stable label for logging and metrics.
pub fn error_label(error: &CadenceError) -> &'static str {
    match error {
        CadenceError::Database(_) => "database",
        CadenceError::Config(_) => "config",
        CadenceError::NotFound(_) => "not_found",
        CadenceError::InvalidInput(_) => "invalid_input",
        CadenceError::InvalidWeekKey(_) => "invalid_week_key",
        CadenceError::InvalidInstant(_) => "invalid_instant",
        CadenceError::Forbidden(_) => "forbidden",
        CadenceError::Conflict(_) => "conflict",
        CadenceError::Internal(_) => "internal",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CadenceError::NotFound(_) => StatusCode::NOT_FOUND,
            CadenceError::InvalidInput(_)
            | CadenceError::InvalidWeekKey(_)
            | CadenceError::InvalidInstant(_) => StatusCode::BAD_REQUEST,
            CadenceError::Forbidden(_) => StatusCode::FORBIDDEN,
            CadenceError::Conflict(_) => StatusCode::CONFLICT,
            CadenceError::Database(_) | CadenceError::Config(_) | CadenceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            error!(label = error_label(&self.0), error = %self.0, "request failed");
        } else {
            warn!(label = error_label(&self.0), error = %self.0, "request rejected");
        }

        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

/// Handler result alias.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
