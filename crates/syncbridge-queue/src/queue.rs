//! Durable failed-record queue (spec §4.6): `enqueue`, `list`, `retry`,
//! `retry_all`, `dismiss`. Uniqueness is enforced by `(entity_type,
//! entity_id)` — re-enqueuing an existing key bumps its attempt counter
//! instead of creating a duplicate row.

use crate::failure::Failure;
use crate::filter::{Page, Paging, QueueFilter};
use crate::resync::Resync;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;
use syncbridge_core::{EntityType, FailedRecord, FailedRecordState, SyncError};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    Succeeded,
    FailedAgain,
}

pub struct FailedRecordQueue {
    records: Mutex<BTreeMap<(EntityType, String), FailedRecord>>,
}

impl Default for FailedRecordQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl FailedRecordQueue {
    pub fn new() -> Self {
        Self { records: Mutex::new(BTreeMap::new()) }
    }

    /// Inserts a new failed record, or updates the existing one for the
    /// same `(entity_type, entity_id)` — incrementing `attempt_count` and
    /// refreshing the failure detail (spec §4.6).
    pub fn enqueue(&self, entity_type: EntityType, entity_id: impl Into<String>, failure: Failure) -> Uuid {
        let entity_id = entity_id.into();
        let now = Utc::now();
        let mut records = self.records.lock().unwrap();

        match records.get_mut(&(entity_type, entity_id.clone())) {
            Some(existing) => {
                existing.attempt_count += 1;
                existing.last_failed_at = now;
                existing.http_status = failure.http_status;
                existing.last_error_message = failure.message;
                existing.failed_fields = failure.failed_fields;
                existing.state = FailedRecordState::Queued;
                existing.id
            }
            None => {
                let id = Uuid::now_v7();
                records.insert(
                    (entity_type, entity_id.clone()),
                    FailedRecord {
                        id,
                        entity_type,
                        entity_id,
                        first_failed_at: now,
                        last_failed_at: now,
                        attempt_count: 1,
                        http_status: failure.http_status,
                        last_error_message: failure.message,
                        failed_fields: failure.failed_fields,
                        state: FailedRecordState::Queued,
                    },
                );
                id
            }
        }
    }

    /// Removes a record on successful upsert (spec §4.6: "a record is
    /// removed from the queue on successful upsert"). No-op if the entity
    /// wasn't queued.
    pub fn remove(&self, entity_type: EntityType, entity_id: &str) {
        self.records.lock().unwrap().remove(&(entity_type, entity_id.to_string()));
    }

    pub fn list(&self, filter: &QueueFilter, paging: Paging) -> Page<FailedRecord> {
        let records = self.records.lock().unwrap();
        let mut matching: Vec<FailedRecord> = records
            .values()
            .filter(|r| filter.entity_type.map(|t| t == r.entity_type).unwrap_or(true))
            .filter(|r| filter.include_dismissed || r.state != FailedRecordState::Dismissed)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.last_failed_at.cmp(&b.last_failed_at));

        let total = matching.len();
        let items = matching.into_iter().skip(paging.offset).take(paging.limit).collect();
        Page { items, total }
    }

    pub fn get(&self, id: Uuid) -> Option<FailedRecord> {
        self.records.lock().unwrap().values().find(|r| r.id == id).cloned()
    }

    /// Hides a record from default listings without deleting it (spec
    /// §4.6: "dismissed records are retained but hidden from default
    /// listings").
    pub fn dismiss(&self, id: Uuid) -> Result<(), SyncError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .values_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| SyncError::Internal { message: format!("no failed record with id {id}") })?;
        record.state = FailedRecordState::Dismissed;
        Ok(())
    }

    /// Re-invokes the per-entity syncer path for one queued record. On
    /// success the record is removed; on failure its attempt counter and
    /// error detail are refreshed in place.
    pub async fn retry(&self, id: Uuid, resync: &dyn Resync) -> Result<RetryOutcome, SyncError> {
        let (entity_type, entity_id) = {
            let records = self.records.lock().unwrap();
            let record = records
                .values()
                .find(|r| r.id == id)
                .ok_or_else(|| SyncError::Internal { message: format!("no failed record with id {id}") })?;
            (record.entity_type, record.entity_id.clone())
        };

        match resync.resync(entity_type, &entity_id).await {
            Ok(()) => {
                self.remove(entity_type, &entity_id);
                Ok(RetryOutcome::Succeeded)
            }
            Err(err) => {
                self.enqueue(entity_type, entity_id, Failure::new(err.to_string()));
                Ok(RetryOutcome::FailedAgain)
            }
        }
    }

    /// Retries every queued (non-dismissed) record, optionally scoped to
    /// one entity type, in business-id order.
    pub async fn retry_all(&self, entity_type: Option<EntityType>, resync: &dyn Resync) -> Vec<(Uuid, RetryOutcome)> {
        let ids: Vec<Uuid> = {
            let records = self.records.lock().unwrap();
            records
                .values()
                .filter(|r| entity_type.map(|t| t == r.entity_type).unwrap_or(true))
                .filter(|r| r.state == FailedRecordState::Queued)
                .map(|r| r.id)
                .collect()
        };

        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            match self.retry(id, resync).await {
                Ok(outcome) => outcomes.push((id, outcome)),
                Err(_) => continue,
            }
        }
        outcomes
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AlwaysSucceeds;

    #[async_trait]
    impl Resync for AlwaysSucceeds {
        async fn resync(&self, _entity_type: EntityType, _entity_id: &str) -> Result<(), SyncError> {
            Ok(())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Resync for AlwaysFails {
        async fn resync(&self, _entity_type: EntityType, _entity_id: &str) -> Result<(), SyncError> {
            Err(SyncError::Conflict { message: "still conflicting".into() })
        }
    }

    struct CountingResync(AtomicUsize);

    #[async_trait]
    impl Resync for CountingResync {
        async fn resync(&self, _entity_type: EntityType, _entity_id: &str) -> Result<(), SyncError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn enqueueing_the_same_entity_twice_bumps_attempt_count_not_row_count() {
        let queue = FailedRecordQueue::new();
        queue.enqueue(EntityType::Employee, "e1", Failure::new("bad phone"));
        queue.enqueue(EntityType::Employee, "e1", Failure::new("bad phone again"));

        assert_eq!(queue.len(), 1);
        let record = queue.list(&QueueFilter::default(), Paging::default()).items.remove(0);
        assert_eq!(record.attempt_count, 2);
        assert_eq!(record.last_error_message, "bad phone again");
    }

    #[test]
    fn dismissed_records_are_hidden_from_default_listings_but_retained() {
        let queue = FailedRecordQueue::new();
        let id = queue.enqueue(EntityType::Vehicle, "v1", Failure::new("conflict"));
        queue.dismiss(id).unwrap();

        assert!(queue.list(&QueueFilter::default(), Paging::default()).items.is_empty());
        let filter = QueueFilter { include_dismissed: true, ..Default::default() };
        assert_eq!(queue.list(&filter, Paging::default()).items.len(), 1);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn successful_retry_removes_the_record() {
        let queue = FailedRecordQueue::new();
        let id = queue.enqueue(EntityType::Employee, "e1", Failure::new("timeout"));

        let outcome = queue.retry(id, &AlwaysSucceeds).await.unwrap();
        assert_eq!(outcome, RetryOutcome::Succeeded);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn failed_retry_keeps_the_record_and_bumps_attempts() {
        let queue = FailedRecordQueue::new();
        let id = queue.enqueue(EntityType::Employee, "e1", Failure::new("timeout"));

        queue.retry(id, &AlwaysFails).await.unwrap();
        let record = queue.get(id).unwrap();
        assert_eq!(record.attempt_count, 2);
        assert_eq!(record.last_error_message, "still conflicting");
    }

    #[tokio::test]
    async fn retry_all_scoped_to_an_entity_type_only_touches_that_type() {
        let queue = FailedRecordQueue::new();
        queue.enqueue(EntityType::Employee, "e1", Failure::new("x"));
        queue.enqueue(EntityType::Vehicle, "v1", Failure::new("y"));

        let resync = CountingResync(AtomicUsize::new(0));
        let outcomes = queue.retry_all(Some(EntityType::Employee), &resync).await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(resync.0.load(Ordering::SeqCst), 1);
        assert_eq!(queue.len(), 1);
    }
}
