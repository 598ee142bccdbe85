//! `/health`, `/ready`, `/metrics`, `/status/live` (spec §4.8).

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let snapshot = state.http_client.dependency_health().snapshot();
    let down: Vec<String> = snapshot
        .iter()
        .filter(|h| h.status != syncbridge_core::HealthStatus::Up)
        .map(|h| format!("{}: {:?}", h.name, h.status))
        .collect();

    if down.is_empty() {
        (StatusCode::OK, Json(json!({"ready": true})))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"ready": false, "reasons": down})))
    }
}

pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

pub async fn status_live(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.controller.status();
    Json(json!({
        "current": snapshot.current,
        "paused": snapshot.paused,
        "paused_by": snapshot.paused_by,
        "paused_at": snapshot.paused_at,
        "last_session": snapshot.last_session,
    }))
}
