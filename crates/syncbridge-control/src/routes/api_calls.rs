//! `GET /api-calls`, `GET /dependencies/health` (spec §4.8).

use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use syncbridge_http::ApiCallFilter;

#[derive(Debug, Deserialize, Default)]
pub struct ApiCallsQuery {
    pub service: Option<String>,
    pub method: Option<String>,
    pub status_code: Option<u16>,
    #[serde(default)]
    pub errors_only: bool,
    #[serde(default)]
    pub limit: usize,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<ApiCallsQuery>) -> Json<serde_json::Value> {
    let filter = ApiCallFilter {
        service: query.service,
        method: query.method,
        status_code: query.status_code,
        errors_only: query.errors_only,
        limit: query.limit,
    };
    let records = state.http_client.call_log().query(&filter);
    Json(serde_json::json!({ "calls": records }))
}

pub async fn dependencies_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.http_client.dependency_health().snapshot();
    Json(serde_json::json!({ "dependencies": snapshot }))
}
