//! `GET /sync/trigger/status`, `POST /sync/trigger`, `GET|POST /sync/pause`
//! (spec §4.7, §4.8). `/sync/pause` is rate-limited locally: excessive
//! calls get a `429` before ever reaching the controller.

use crate::auth::Operator;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use syncbridge_core::{AuditAction, SyncType};
use syncbridge_engine::{TriggerError, TriggerOutcome};

pub async fn trigger_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.controller.status();
    Json(json!({
        "current": snapshot.current,
        "history": snapshot.history,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TriggerRequest {
    pub sync_type: SyncType,
}

pub async fn trigger(State(state): State<AppState>, operator: Operator, Json(request): Json<TriggerRequest>) -> Result<Json<serde_json::Value>, ApiError> {
    match state.controller.trigger_sync(request.sync_type) {
        Ok(outcome) => {
            state.audit.record(&operator.0, AuditAction::TriggerSync, request.sync_type.as_str(), None);
            let accepted = matches!(outcome, TriggerOutcome::Started | TriggerOutcome::Queued);
            Ok(Json(json!({ "outcome": format!("{outcome:?}"), "accepted": accepted })))
        }
        Err(TriggerError::Paused) => Err(ApiError::Sync(syncbridge_core::SyncError::Conflict {
            message: "sync is paused".into(),
        })),
        Err(TriggerError::QueueFull) => Err(ApiError::Sync(syncbridge_core::SyncError::Conflict {
            message: "too many sync triggers are already queued".into(),
        })),
    }
}

pub async fn pause_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "paused": state.controller.is_paused() }))
}

#[derive(Debug, Deserialize)]
pub struct PauseRequest {
    pub paused: bool,
}

pub async fn pause(State(state): State<AppState>, operator: Operator, Json(request): Json<PauseRequest>) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.pause_rate_limiter.try_acquire() {
        return Err(ApiError::TooManyRequests);
    }

    if request.paused {
        let pause_state = state.controller.pause(operator.0.clone());
        state.audit.record(&operator.0, AuditAction::PauseSync, "sync", None);
        Ok(Json(json!(pause_state)))
    } else {
        let pause_state = state.controller.resume();
        state.audit.record(&operator.0, AuditAction::ResumeSync, "sync", None);
        Ok(Json(json!(pause_state)))
    }
}
