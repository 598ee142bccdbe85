//! The shared adapter contract (spec §4.3): every dependency exposes the
//! same four operations regardless of whether it's backed by HTTP or SQL
//! underneath, so the sync engine never has to know which.

use crate::kind::AdapterKind;
use async_trait::async_trait;
use serde_json::Value;
use syncbridge_core::{EntityType, SyncError};

/// Outcome of a write, reported back to the change tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
}

/// Outcome of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// One listed record: the raw payload plus whatever business id the
/// adapter extracted from it, so callers don't need to know the payload
/// shape to build an index.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ListedRecord {
    pub id: String,
    pub payload: Value,
}

/// A paginated, restartable read/write surface over one external
/// dependency for one entity type at a time. Implementors are `Send +
/// Sync` since the engine shares one adapter instance across concurrent
/// syncers via `Arc`.
#[async_trait]
pub trait EntityAdapter: Send + Sync {
    fn kind(&self) -> AdapterKind;

    /// A stable ordering by primary id (spec §4.3): callers rely on this to
    /// resume a page-safe walk after a restart.
    async fn list_all(&self, entity_type: EntityType) -> Result<Vec<ListedRecord>, SyncError>;

    /// `Ok(None)` on a 404/missing row — absence is not an error (spec §4.3).
    async fn get_by_id(&self, entity_type: EntityType, id: &str) -> Result<Option<Value>, SyncError>;

    /// Idempotent on `idempotency_key`: calling twice with the same key and
    /// payload must not create a duplicate record.
    async fn upsert(
        &self,
        entity_type: EntityType,
        id: &str,
        payload: &Value,
        idempotency_key: &str,
    ) -> Result<WriteOutcome, SyncError>;

    async fn delete(&self, entity_type: EntityType, id: &str) -> Result<DeleteOutcome, SyncError>;
}

/// The error a read-only adapter (fleet, directory, erp) returns for a
/// write call it structurally cannot satisfy. Not a wire failure, so it's
/// `Internal` rather than `DependencyUnavailable` — a caller that routes a
/// write to one of these adapters has a bug, not a transient condition.
pub fn read_only_write_error(kind: AdapterKind) -> SyncError {
    SyncError::Internal {
        message: format!("{kind} adapter is read-only; writes must go through the target adapter"),
    }
}
