//! Operator bearer-token identity (spec §4.8: every write endpoint checks
//! the caller against `Settings::operator_tokens` and records who acted).

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use syncbridge_core::Settings;

/// The authenticated operator's identity, extracted from the `Authorization:
/// Bearer <token>` header. `Display`s as a short, non-secret label derived
/// from the token's position in the configured list — never the token
/// itself — so it's safe to pass straight into an `AuditEntry.user` field.
pub struct Operator(pub String);

#[async_trait::async_trait]
impl FromRequestParts<AppState> for Operator {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;
        match operator_index(&state.settings, token) {
            Some(index) => Ok(Operator(format!("operator-{index}"))),
            None => Err(ApiError::Unauthorized),
        }
    }
}

fn operator_index(settings: &Settings, token: &str) -> Option<usize> {
    settings.operator_tokens.iter().position(|candidate| candidate.expose() == token)
}
