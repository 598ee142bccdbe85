//! `GET /cache/stats`, `POST /cache/invalidate/{key|all}`,
//! `POST /cache/refresh/{key}` (spec §4.8).

use crate::auth::Operator;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use syncbridge_cache::CacheStats;
use syncbridge_core::AuditAction;

pub async fn stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats().await)
}

pub async fn invalidate(State(state): State<AppState>, operator: Operator, Path(key): Path<String>) -> Json<serde_json::Value> {
    if key == "all" {
        let stats = state.cache.stats().await;
        for cached_key in stats.caches.keys() {
            state.cache.invalidate(cached_key).await;
        }
    } else {
        state.cache.invalidate(&key).await;
    }
    state.audit.record(&operator.0, AuditAction::CacheInvalidate, &key, None);
    Json(serde_json::json!({ "invalidated": key }))
}

pub async fn refresh(State(state): State<AppState>, operator: Operator, Path(key): Path<String>) -> Json<serde_json::Value> {
    state.cache.refresh(&key);
    state.audit.record(&operator.0, AuditAction::CacheRefresh, &key, None);
    Json(serde_json::json!({ "refreshed": key }))
}
