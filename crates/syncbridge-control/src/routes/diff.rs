//! `GET /diff/{entity_type}/{entity_id}` (spec §4.8): a point-in-time
//! source-vs-target comparison, bypassing the cache — this reads straight
//! from the adapters `SessionController::factory` exposes, since an
//! operator asking for a diff wants the current state, not whatever's
//! still fresh in the listing cache.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use syncbridge_core::EntityType;
use syncbridge_engine::diff_fields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    InSync,
    Different,
    SourceMissing,
    TargetMissing,
    BothMissing,
}

pub async fn diff(State(state): State<AppState>, Path((entity_type, entity_id)): Path<(String, String)>) -> Result<Json<serde_json::Value>, ApiError> {
    let entity_type: EntityType = entity_type.parse().map_err(ApiError::BadRequest)?;
    let factory = state
        .controller
        .factory(entity_type)
        .ok_or_else(|| ApiError::NotFound(format!("no syncer configured for {entity_type}")))?;

    let source = factory.source.get_by_id(entity_type, &entity_id).await.map_err(ApiError::Sync)?;
    let target = factory.target.get_by_id(entity_type, &entity_id).await.map_err(ApiError::Sync)?;

    let (status, changes) = match (&source, &target) {
        (None, None) => (DiffStatus::BothMissing, None),
        (Some(_), None) => (DiffStatus::TargetMissing, None),
        (None, Some(_)) => (DiffStatus::SourceMissing, None),
        (Some(source_payload), Some(target_payload)) => {
            let changes = diff_fields(Some(target_payload), source_payload);
            if changes.is_empty() {
                (DiffStatus::InSync, None)
            } else {
                (DiffStatus::Different, Some(changes))
            }
        }
    };

    Ok(Json(serde_json::json!({
        "entity_type": entity_type,
        "entity_id": entity_id,
        "status": status,
        "changes": changes,
    })))
}
