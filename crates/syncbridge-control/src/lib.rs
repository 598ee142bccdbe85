//! The control-plane HTTP server (spec §4.8): the operator read/write
//! surface over the sync engine, built on `axum` + `tower-http` the way
//! the teacher's `axum-resilient-kv-store` demo is — a shared `AppState`
//! of `Arc` handles, one `Router` wiring every route.

pub mod audit;
pub mod auth;
pub mod error;
pub mod rate_limit;
mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/ready", get(routes::health::ready))
        .route("/metrics", get(routes::health::metrics))
        .route("/status/live", get(routes::health::status_live))
        .route("/entities/counts", get(routes::entities::counts))
        .route("/cache/stats", get(routes::cache::stats))
        .route("/cache/invalidate/:key", post(routes::cache::invalidate))
        .route("/cache/refresh/:key", post(routes::cache::refresh))
        .route("/api-calls", get(routes::api_calls::list))
        .route("/dependencies/health", get(routes::api_calls::dependencies_health))
        .route("/errors/suggestions", get(routes::errors::suggestions))
        .route("/failed-records", get(routes::failed_records::list))
        .route("/failed-records/:id/retry", post(routes::failed_records::retry))
        .route("/failed-records/:id/dismiss", post(routes::failed_records::dismiss))
        .route("/failed-records/retry-all", post(routes::failed_records::retry_all))
        .route("/notifications", get(routes::notifications::list))
        .route("/audit", get(routes::audit::list))
        .route("/sync/trigger/status", get(routes::sync::trigger_status))
        .route("/sync/trigger", post(routes::sync::trigger))
        .route("/sync/pause", get(routes::sync::pause_status).post(routes::sync::pause))
        .route("/diff/:entity_type/:entity_id", get(routes::diff::diff))
        .route("/export/:report", get(routes::export::export))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}
