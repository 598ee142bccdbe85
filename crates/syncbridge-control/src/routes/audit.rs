//! `GET /audit?action&limit` (spec §4.8).

use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use syncbridge_core::AuditAction;

#[derive(Debug, Deserialize, Default)]
pub struct AuditQuery {
    pub action: Option<AuditAction>,
    #[serde(default)]
    pub limit: usize,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<AuditQuery>) -> Json<serde_json::Value> {
    let entries = state.audit.recent(query.action, query.limit);
    Json(json!({ "entries": entries }))
}
