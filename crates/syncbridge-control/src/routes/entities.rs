//! `GET /entities/counts` (spec §4.8): cached counts per entity type,
//! read straight off `FreshnessManager::stats()`'s per-key `item_count`.

use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::json;
use syncbridge_core::EntityType;

pub async fn counts(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.cache.stats().await;

    // Syncers cache each entity type's source and target listings under
    // `<entity_type>:source:all` / `<entity_type>:target:all`
    // (`syncbridge-engine::syncer::EntitySyncer::load_listing`); counts
    // reflect the source side — the read-only system of record being
    // reconciled, not what's currently mirrored at the target.
    let counts: serde_json::Map<String, serde_json::Value> = EntityType::SYNC_ORDER
        .into_iter()
        .map(|entity_type| {
            let key = format!("{entity_type}:source:all");
            let count = stats.caches.get(&key).and_then(|summary| summary.item_count);
            (entity_type.as_str().to_string(), json!(count))
        })
        .collect();

    Json(json!({ "counts": counts }))
}
