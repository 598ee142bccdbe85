//! `GET /notifications?status&limit` (spec §4.8).

use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use syncbridge_core::NotificationStatus;

#[derive(Debug, Deserialize, Default)]
pub struct NotificationsQuery {
    pub status: Option<NotificationStatus>,
    #[serde(default)]
    pub limit: usize,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<NotificationsQuery>) -> Json<serde_json::Value> {
    let notifications = state.notifications.recent(query.status, query.limit);
    Json(json!({ "notifications": notifications }))
}
