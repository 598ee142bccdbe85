//! Seam through which [`crate::FailedRecordQueue::retry`] re-invokes the
//! per-entity syncer path (spec §4.6), without the queue depending on the
//! sync engine itself.

use async_trait::async_trait;
use syncbridge_core::{EntityType, SyncError};

#[async_trait]
pub trait Resync: Send + Sync {
    async fn resync(&self, entity_type: EntityType, entity_id: &str) -> Result<(), SyncError>;
}
