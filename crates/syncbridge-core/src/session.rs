//! Data-model types owned by the sync engine, tracker, and control plane
//! (spec §3). These are plain data; the invariants they describe are
//! enforced by the crates that own them (`syncbridge-engine`,
//! `syncbridge-tracker`, `syncbridge-control`), not here.

use crate::entity::EntityType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The kind of run a [`SyncSession`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    Employees,
    Vehicles,
    Departments,
    Jobs,
    Titles,
    Full,
}

impl SyncType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncType::Employees => "employees",
            SyncType::Vehicles => "vehicles",
            SyncType::Departments => "departments",
            SyncType::Jobs => "jobs",
            SyncType::Titles => "titles",
            SyncType::Full => "full",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
}

/// Running counts for a session. The invariant `processed == created +
/// updated + skipped + errors` (spec §8) is checked by
/// `syncbridge-tracker`'s event manager as events are recorded, not here.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SessionCounts {
    pub processed: u64,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSession {
    pub session_id: Uuid,
    pub sync_type: SyncType,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub counts: SessionCounts,
}

impl SyncSession {
    pub fn new(sync_type: SyncType) -> Self {
        Self {
            session_id: Uuid::now_v7(),
            sync_type,
            started_at: Utc::now(),
            ended_at: None,
            status: SessionStatus::Running,
            counts: SessionCounts::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Created,
    Updated,
    Deleted,
    Skipped,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldChange {
    pub before: Option<Value>,
    pub after: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: Uuid,
    pub session_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub operation: Operation,
    pub changes: Option<std::collections::BTreeMap<String, FieldChange>>,
    pub reason: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedRecordState {
    Queued,
    Dismissed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldFailure {
    pub error: String,
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedRecord {
    pub id: Uuid,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub first_failed_at: DateTime<Utc>,
    pub last_failed_at: DateTime<Utc>,
    pub attempt_count: u32,
    pub http_status: Option<u16>,
    pub last_error_message: String,
    pub failed_fields: std::collections::BTreeMap<String, FieldFailure>,
    pub state: FailedRecordState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub subject: String,
    pub recipient: String,
    pub status: NotificationStatus,
    pub timestamp: DateTime<Utc>,
    pub error: Option<String>,
    pub error_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    CacheInvalidate,
    CacheRefresh,
    RetryRecord,
    DismissRecord,
    TriggerSync,
    Export,
    PauseSync,
    ResumeSync,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub ip_address: Option<String>,
    pub action: AuditAction,
    pub resource: String,
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PauseState {
    pub paused: bool,
    pub paused_by: Option<String>,
    pub paused_at: Option<DateTime<Utc>>,
}

/// Health of one external dependency, tracked by the adapters layer and
/// read by `/ready` and `/dependencies/health` (SPEC_FULL §3 addendum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Up,
    Degraded,
    Down,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyHealth {
    pub name: String,
    pub status: HealthStatus,
    pub last_checked: DateTime<Utc>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}

/// One row in the bounded `/api-calls` ring buffer (SPEC_FULL §3 addendum).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCallRecord {
    pub id: Uuid,
    pub service: String,
    pub method: String,
    pub path_template: String,
    pub status_code: Option<u16>,
    pub elapsed_ms: u64,
    pub attempt: u32,
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
    pub error: Option<String>,
}
