//! Maps `SyncError` (and a handful of control-plane-only failure modes)
//! onto the HTTP status table in spec §6, wrapped in the stable
//! `{code, message, details?}` envelope from `syncbridge-core::error`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use syncbridge_core::error::{ErrorEnvelope, SyncError};

pub enum ApiError {
    Sync(SyncError),
    Unauthorized,
    Forbidden,
    NotFound(String),
    BadRequest(String),
    TooManyRequests,
}

impl ApiError {
    fn status_and_envelope(&self) -> (StatusCode, ErrorEnvelope) {
        match self {
            ApiError::Sync(err) => {
                let status = match err {
                    SyncError::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    SyncError::Conflict { .. } => StatusCode::CONFLICT,
                    SyncError::AuthFailed { .. } => StatusCode::UNAUTHORIZED,
                    SyncError::DataMissing { .. } => StatusCode::NOT_FOUND,
                    SyncError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                    SyncError::DependencyUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    SyncError::Transport { .. } | SyncError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, (err).into())
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorEnvelope { code: "unauthorized", message: "missing or invalid bearer token".into(), details: None },
            ),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                ErrorEnvelope { code: "forbidden", message: "operator token not permitted for this action".into(), details: None },
            ),
            ApiError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorEnvelope { code: "not_found", message: format!("{resource} not found"), details: None },
            ),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorEnvelope { code: "bad_request", message: message.clone(), details: None },
            ),
            ApiError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorEnvelope { code: "rate_limited", message: "too many pause/resume calls, slow down".into(), details: None },
            ),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        ApiError::Sync(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, envelope) = self.status_and_envelope();
        (status, Json(envelope)).into_response()
    }
}
