//! `GET /failed-records`, `POST /failed-records/{id}/retry`,
//! `POST /failed-records/{id}/dismiss`, `POST /failed-records/retry-all`
//! (spec §4.6, §4.8).

use crate::auth::Operator;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use syncbridge_core::{AuditAction, EntityType};
use syncbridge_queue::{Paging, QueueFilter};
use uuid::Uuid;

#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    pub entity_type: Option<EntityType>,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Json<serde_json::Value> {
    let filter = QueueFilter { entity_type: query.entity_type, include_dismissed: false };
    let paging = Paging { offset: query.offset, limit: if query.limit == 0 { 50 } else { query.limit } };
    let page = state.queue.list(&filter, paging);
    Json(json!({ "items": page.items, "total": page.total }))
}

pub async fn retry(State(state): State<AppState>, operator: Operator, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
    let outcome = state.queue.retry(id, state.controller.as_ref()).await.map_err(ApiError::Sync)?;
    state.audit.record(&operator.0, AuditAction::RetryRecord, id.to_string(), None);
    Ok(Json(json!({ "outcome": format!("{outcome:?}") })))
}

pub async fn dismiss(State(state): State<AppState>, operator: Operator, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .queue
        .dismiss(id)
        .map_err(ApiError::Sync)?;
    state.audit.record(&operator.0, AuditAction::DismissRecord, id.to_string(), None);
    Ok(Json(json!({ "dismissed": id })))
}

#[derive(Debug, Deserialize, Default)]
pub struct RetryAllQuery {
    pub entity_type: Option<EntityType>,
}

pub async fn retry_all(State(state): State<AppState>, operator: Operator, Query(query): Query<RetryAllQuery>) -> Json<serde_json::Value> {
    let outcomes = state.queue.retry_all(query.entity_type, state.controller.as_ref()).await;
    state.audit.record(&operator.0, AuditAction::RetryRecord, "all", None);
    let results: Vec<serde_json::Value> = outcomes.into_iter().map(|(id, outcome)| json!({"id": id, "outcome": format!("{outcome:?}")})).collect();
    Json(json!({ "results": results }))
}
