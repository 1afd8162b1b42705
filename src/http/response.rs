//! Response handling.
//!
//! # Responsibilities
//! - Map Api errors to HTTP status codes
//! - Render error bodies as `{"code": .., "message": ..}`
//!
//! # Design Decisions
//! - Client input problems → 400, missing records → 404
//! - Storage backend failures → 502 (the backend is an upstream)
//! - Records that no longer decode → 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::api::ApiError;
use crate::store::StoreError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Status code and machine-readable code for an error.
pub fn classify(error: &ApiError) -> (StatusCode, &'static str) {
    match error {
        ApiError::TimerNotFound { .. } | ApiError::GroupNotFound(_) => (StatusCode::NOT_FOUND, "NotFoundError"),
        e if e.is_client_error() => (StatusCode::BAD_REQUEST, "BadRequestError"),
        ApiError::Store(StoreError::Unauthorized) => (StatusCode::BAD_GATEWAY, "BackendUnauthorizedError"),
        ApiError::Store(_) => (StatusCode::BAD_GATEWAY, "BackendError"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = classify(&self);
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }
        (
            status,
            Json(ErrorBody {
                code,
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
