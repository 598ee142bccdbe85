//! The input to [`crate::EventManager::record`]: what a per-entity syncer
//! step ended in (spec §4.5).

use std::collections::BTreeMap;
use syncbridge_core::{Entity, FieldChange, Operation, SyncError};

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub entity: Entity,
    pub operation: Operation,
    pub changes: Option<BTreeMap<String, FieldChange>>,
    pub reason: Option<String>,
    pub error: Option<SyncError>,
}

impl SyncOutcome {
    pub fn created(entity: Entity, changes: BTreeMap<String, FieldChange>) -> Self {
        Self {
            entity,
            operation: Operation::Created,
            changes: Some(changes),
            reason: None,
            error: None,
        }
    }

    pub fn updated(entity: Entity, changes: BTreeMap<String, FieldChange>) -> Self {
        Self {
            entity,
            operation: Operation::Updated,
            changes: Some(changes),
            reason: None,
            error: None,
        }
    }

    pub fn deleted(entity: Entity) -> Self {
        Self {
            entity,
            operation: Operation::Deleted,
            changes: None,
            reason: None,
            error: None,
        }
    }

    pub fn skipped(entity: Entity, reason: impl Into<String>) -> Self {
        Self {
            entity,
            operation: Operation::Skipped,
            changes: None,
            reason: Some(reason.into()),
            error: None,
        }
    }

    pub fn errored(entity: Entity, error: SyncError) -> Self {
        Self {
            entity,
            operation: Operation::Error,
            changes: None,
            reason: None,
            error: Some(error),
        }
    }
}
