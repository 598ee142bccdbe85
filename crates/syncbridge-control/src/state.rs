//! Shared application state (spec §4.8), matching the teacher's
//! `axum-resilient-kv-store` demo's single `AppState` struct holding
//! `Arc`/`Mutex` handles to every component a handler might need.

use crate::audit::AuditLog;
use crate::rate_limit::LocalRateLimiter;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::Arc;
use syncbridge_cache::FreshnessManager;
use syncbridge_core::Settings;
use syncbridge_engine::{Scheduler, SessionController};
use syncbridge_queue::FailedRecordQueue;
use syncbridge_tracker::{ErrorLog, NotificationLog};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub controller: Arc<SessionController>,
    /// Kept alive for its `Drop` impl; handlers don't call it directly.
    pub scheduler: Arc<Scheduler>,
    pub cache: Arc<FreshnessManager>,
    pub queue: Arc<FailedRecordQueue>,
    pub http_client: Arc<syncbridge_http::SyncHttpClient>,
    pub notifications: Arc<NotificationLog>,
    pub error_log: Arc<ErrorLog>,
    pub audit: Arc<AuditLog>,
    pub pause_rate_limiter: Arc<LocalRateLimiter>,
    pub metrics_handle: PrometheusHandle,
    pub output_dir: PathBuf,
}
