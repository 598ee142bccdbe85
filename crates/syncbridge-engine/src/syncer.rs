//! The per-entity syncer (spec §4.7): acquire source/target listings,
//! diff them, validate and upsert the delta, record outcomes, and push
//! non-retryable failures to the failed-record queue.

use crate::diff::{self, Delta};
use crate::field_changes::diff_fields;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use syncbridge_adapters::{EntityAdapter, ListedRecord, WriteOutcome};
use syncbridge_cache::FreshnessManager;
use syncbridge_core::{fingerprint, Entity, EntityType, FieldFailure, SyncError};
use syncbridge_queue::{Failure, FailedRecordQueue, Resync};
use syncbridge_tracker::{EventManager, SyncOutcome};
use syncbridge_validator::{validate, ValidatorConfig};
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// Reason recorded on a `skipped` event when the soft deadline (spec §5:
/// `sync_interval * 0.8`) is hit mid-syncer.
pub const DEADLINE_EXCEEDED_REASON: &str = "deadline_exceeded";

/// Reason recorded on a `skipped` event for a target record with no
/// source counterpart while `deletes_enabled` is off (spec §9's Open
/// Question, decided in DESIGN.md).
pub const ORPHAN_REASON: &str = "orphan";

pub struct EntitySyncer {
    pub entity_type: EntityType,
    pub source: Arc<dyn EntityAdapter>,
    pub target: Arc<dyn EntityAdapter>,
    pub cache: Arc<FreshnessManager>,
    pub cache_ttl: Duration,
    pub validator_config: ValidatorConfig,
    pub tracker: Arc<EventManager>,
    pub queue: Arc<FailedRecordQueue>,
    pub deletes_enabled: bool,
    pub entity_concurrency: usize,
}

/// Everything an [`EntitySyncer`] needs except a tracker, held by the
/// controller and turned into a fresh syncer — sharing the same
/// `Arc<EventManager>` as its siblings — at the start of every session
/// (spec §3: counts are aggregated per session, across every entity type
/// processed in it, not per entity type).
pub struct EntitySyncerFactory {
    pub entity_type: EntityType,
    pub source: Arc<dyn EntityAdapter>,
    pub target: Arc<dyn EntityAdapter>,
    pub cache: Arc<FreshnessManager>,
    pub cache_ttl: Duration,
    pub validator_config: ValidatorConfig,
    pub queue: Arc<FailedRecordQueue>,
    pub deletes_enabled: bool,
    pub entity_concurrency: usize,
}

impl EntitySyncerFactory {
    pub fn build(&self, tracker: Arc<EventManager>) -> EntitySyncer {
        EntitySyncer {
            entity_type: self.entity_type,
            source: self.source.clone(),
            target: self.target.clone(),
            cache: self.cache.clone(),
            cache_ttl: self.cache_ttl,
            validator_config: self.validator_config.clone(),
            tracker,
            queue: self.queue.clone(),
            deletes_enabled: self.deletes_enabled,
            entity_concurrency: self.entity_concurrency,
        }
    }
}

impl EntitySyncer {
    /// Runs one full pass for this entity type. Returns `Err` only for an
    /// adapter-level authentication failure, which aborts the enclosing
    /// session (spec §4.7's failure semantics) — every other error is
    /// recorded and the syncer continues.
    pub async fn run(&self, deadline: Instant) -> Result<(), SyncError> {
        let source_list = self.load_listing(self.source.clone(), "source").await?;
        let target_list = self.load_listing(self.target.clone(), "target").await?;
        let delta = diff::compute(&source_list, &target_list);

        self.process_skips(&delta).await;
        self.process_writes(&delta, deadline).await?;
        self.process_deletes(&delta, deadline).await?;
        Ok(())
    }

    async fn load_listing(&self, adapter: Arc<dyn EntityAdapter>, role: &str) -> Result<Vec<ListedRecord>, SyncError> {
        let key = format!("{}:{role}:all", self.entity_type.as_str());
        let entity_type = self.entity_type;
        let value = self
            .cache
            .get_or_load(&key, self.cache_ttl, || async move {
                let records = adapter.list_all(entity_type).await.map_err(|err| err.to_string())?;
                serde_json::to_value(&records).map_err(|err| err.to_string())
            })
            .await
            .map_err(|err| SyncError::Internal { message: format!("loading {role} listing for {entity_type}: {err}") })?;

        serde_json::from_value(value)
            .map_err(|err| SyncError::Internal { message: format!("malformed cached {role} listing for {entity_type}: {err}") })
    }

    async fn process_skips(&self, delta: &Delta) {
        for record in &delta.to_skip {
            let entity = self.entity(record.id.clone(), record.payload.clone(), Some(record.payload.clone()));
            self.tracker.record(SyncOutcome::skipped(entity, "unchanged")).await;
        }
    }

    async fn process_writes(&self, delta: &Delta, deadline: Instant) -> Result<(), SyncError> {
        let semaphore = Arc::new(Semaphore::new(self.entity_concurrency.max(1)));
        let mut past_deadline = false;

        for record in &delta.to_create {
            if Instant::now() >= deadline {
                past_deadline = true;
            }
            if past_deadline {
                let entity = self.entity(record.id.clone(), record.payload.clone(), None);
                self.tracker.record(SyncOutcome::skipped(entity, DEADLINE_EXCEEDED_REASON)).await;
                continue;
            }
            let _permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
            self.upsert_one(record.id.clone(), record.payload.clone(), None).await?;
        }

        for (record, previous) in &delta.to_update {
            if Instant::now() >= deadline {
                past_deadline = true;
            }
            if past_deadline {
                let entity = self.entity(record.id.clone(), record.payload.clone(), Some(previous.clone()));
                self.tracker.record(SyncOutcome::skipped(entity, DEADLINE_EXCEEDED_REASON)).await;
                continue;
            }
            let _permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
            self.upsert_one(record.id.clone(), record.payload.clone(), Some(previous.clone())).await?;
        }

        Ok(())
    }

    /// When `deletes_enabled` is off (the default, spec §4.7), a target
    /// record with no source counterpart is recorded as `skipped{reason:
    /// "orphan"}` rather than silently dropped — an Open Question the
    /// spec leaves to the implementer (see DESIGN.md).
    async fn process_deletes(&self, delta: &Delta, deadline: Instant) -> Result<(), SyncError> {
        for record in &delta.to_delete {
            if !self.deletes_enabled {
                let entity = self.entity(record.id.clone(), record.payload.clone(), Some(record.payload.clone()));
                self.tracker.record(SyncOutcome::skipped(entity, ORPHAN_REASON)).await;
                continue;
            }
            if Instant::now() >= deadline {
                let entity = self.entity(record.id.clone(), record.payload.clone(), Some(record.payload.clone()));
                self.tracker.record(SyncOutcome::skipped(entity, DEADLINE_EXCEEDED_REASON)).await;
                continue;
            }
            match self.target.delete(self.entity_type, &record.id).await {
                Ok(_) => {
                    let entity = self.entity(record.id.clone(), record.payload.clone(), Some(record.payload.clone()));
                    self.tracker.record(SyncOutcome::deleted(entity)).await;
                }
                Err(SyncError::AuthFailed { service }) => return Err(SyncError::AuthFailed { service }),
                Err(err) => {
                    let entity = self.entity(record.id.clone(), record.payload.clone(), Some(record.payload.clone()));
                    self.enqueue_failure(&entity, &err);
                    self.tracker.record(SyncOutcome::errored(entity, err)).await;
                }
            }
        }
        Ok(())
    }

    /// Validates and upserts one record: the step shared by a normal
    /// session pass and [`Self::resync_one`]'s manual-retry path.
    async fn upsert_one(&self, id: String, payload: Value, previous: Option<Value>) -> Result<(), SyncError> {
        let outcome = validate(self.entity_type, &payload, &self.validator_config);
        let entity = self.entity(id.clone(), outcome.payload.clone(), previous.clone());

        if !outcome.valid {
            self.enqueue_validation_failure(&entity, &outcome.errors);
            let message = outcome.errors.iter().map(|e| e.message.clone()).collect::<Vec<_>>().join("; ");
            self.tracker
                .record(SyncOutcome::errored(
                    entity,
                    SyncError::ValidationFailed {
                        entity_type: self.entity_type.to_string(),
                        entity_id: id,
                        message,
                    },
                ))
                .await;
            return Ok(());
        }

        let idempotency_key = format!("{}:{}:{}", self.entity_type.as_str(), id, fingerprint(&outcome.payload));
        match self.target.upsert(self.entity_type, &id, &outcome.payload, &idempotency_key).await {
            Ok(WriteOutcome::Created) => {
                self.queue.remove(self.entity_type, &id);
                let changes = diff_fields(None, &outcome.payload);
                self.tracker.record(SyncOutcome::created(entity, changes)).await;
            }
            Ok(WriteOutcome::Updated) => {
                self.queue.remove(self.entity_type, &id);
                let changes = diff_fields(previous.as_ref(), &outcome.payload);
                self.tracker.record(SyncOutcome::updated(entity, changes)).await;
            }
            Err(SyncError::AuthFailed { service }) => return Err(SyncError::AuthFailed { service }),
            Err(err) => {
                self.enqueue_failure(&entity, &err);
                self.tracker.record(SyncOutcome::errored(entity, err)).await;
            }
        }
        Ok(())
    }

    /// Re-invokes the validate/upsert path for one failed-record id (spec
    /// §4.6's `retry`). Fetches a fresh copy from the source first —
    /// retrying should reflect whatever fixed the underlying problem.
    pub async fn resync_one(&self, id: &str) -> Result<(), SyncError> {
        let payload = self
            .source
            .get_by_id(self.entity_type, id)
            .await?
            .ok_or_else(|| SyncError::DataMissing { message: format!("{} {id} no longer exists at the source", self.entity_type) })?;
        let previous = self.target.get_by_id(self.entity_type, id).await?;
        self.upsert_one(id.to_string(), payload, previous).await
    }

    fn enqueue_validation_failure(&self, entity: &Entity, errors: &[syncbridge_validator::ValidationError]) {
        let failed_fields = errors
            .iter()
            .map(|e| (e.field.clone(), FieldFailure { error: e.message.clone(), value: None }))
            .collect();
        let message = errors.iter().map(|e| e.message.clone()).collect::<Vec<_>>().join("; ");
        self.queue.enqueue(self.entity_type, entity.entity_id.clone(), Failure::new(message).with_failed_fields(failed_fields));
    }

    fn enqueue_failure(&self, entity: &Entity, error: &SyncError) {
        let mut failure = Failure::new(error.to_string());
        if let SyncError::ValidationFailed { .. } = error {
            failure = failure.with_http_status(422);
        }
        if let SyncError::Conflict { .. } = error {
            failure = failure.with_http_status(409);
        }
        self.queue.enqueue(self.entity_type, entity.entity_id.clone(), failure);
    }

    fn entity(&self, id: String, payload: Value, target_payload: Option<Value>) -> Entity {
        Entity {
            entity_type: self.entity_type,
            entity_id: id,
            fingerprint: fingerprint(&payload),
            source_payload: payload,
            target_payload,
        }
    }
}

/// Lets `syncbridge-queue`'s `FailedRecordQueue::retry` re-invoke this
/// syncer's validate/upsert path without the queue crate depending on the
/// engine (spec §4.6).
#[async_trait]
impl Resync for EntitySyncer {
    async fn resync(&self, entity_type: EntityType, entity_id: &str) -> Result<(), SyncError> {
        debug_assert_eq!(entity_type, self.entity_type, "a queue keyed by (entity_type, id) should only ever route back to its own syncer");
        self.resync_one(entity_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use syncbridge_adapters::{AdapterKind, DeleteOutcome};
    use syncbridge_core::Settings;
    use syncbridge_tracker::{EventManager, RecordingNotifier};
    use uuid::Uuid;

    struct FakeAdapter {
        kind: AdapterKind,
        records: Mutex<Vec<ListedRecord>>,
        upserts: Mutex<Vec<(String, Value)>>,
    }

    impl FakeAdapter {
        fn new(kind: AdapterKind, records: Vec<ListedRecord>) -> Self {
            Self { kind, records: Mutex::new(records), upserts: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl EntityAdapter for FakeAdapter {
        fn kind(&self) -> AdapterKind {
            self.kind
        }

        async fn list_all(&self, _entity_type: EntityType) -> Result<Vec<ListedRecord>, SyncError> {
            Ok(self.records.lock().unwrap().clone())
        }

        async fn get_by_id(&self, _entity_type: EntityType, id: &str) -> Result<Option<Value>, SyncError> {
            Ok(self.records.lock().unwrap().iter().find(|r| r.id == id).map(|r| r.payload.clone()))
        }

        async fn upsert(&self, _entity_type: EntityType, id: &str, payload: &Value, _idempotency_key: &str) -> Result<WriteOutcome, SyncError> {
            let mut records = self.records.lock().unwrap();
            self.upserts.lock().unwrap().push((id.to_string(), payload.clone()));
            let existing = records.iter_mut().find(|r| r.id == id);
            match existing {
                Some(r) => {
                    r.payload = payload.clone();
                    Ok(WriteOutcome::Updated)
                }
                None => {
                    records.push(ListedRecord { id: id.to_string(), payload: payload.clone() });
                    Ok(WriteOutcome::Created)
                }
            }
        }

        async fn delete(&self, _entity_type: EntityType, id: &str) -> Result<DeleteOutcome, SyncError> {
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|r| r.id != id);
            Ok(if records.len() < before { DeleteOutcome::Deleted } else { DeleteOutcome::NotFound })
        }
    }

    fn syncer(source: Vec<ListedRecord>, target: Vec<ListedRecord>, dir: &std::path::Path) -> EntitySyncer {
        EntitySyncer {
            entity_type: EntityType::Employee,
            source: Arc::new(FakeAdapter::new(AdapterKind::Erp, source)),
            target: Arc::new(FakeAdapter::new(AdapterKind::Target, target)),
            cache: Arc::new(FreshnessManager::new(syncbridge_cache::CacheManagerConfig::default())),
            cache_ttl: Duration::from_secs(3600),
            validator_config: ValidatorConfig::from(&Settings::default()),
            tracker: Arc::new(EventManager::new(Uuid::now_v7(), dir, Duration::from_secs(3600), Arc::new(RecordingNotifier::new()))),
            queue: Arc::new(FailedRecordQueue::new()),
            deletes_enabled: false,
            entity_concurrency: 4,
        }
    }

    fn employee(id: &str, first: &str, last: &str, email: &str) -> ListedRecord {
        ListedRecord { id: id.to_string(), payload: json!({"id": id, "first_name": first, "last_name": last, "email": email}) }
    }

    #[tokio::test]
    async fn happy_path_create_produces_one_created_event() {
        let dir = tempfile::tempdir().unwrap();
        let syncer = syncer(vec![employee("1001", "Jane", "Doe", "jane.doe@x.com")], vec![], dir.path());

        syncer.run(Instant::now() + Duration::from_secs(10)).await.unwrap();

        let counts = syncer.tracker.counts();
        assert_eq!(counts.processed, 1);
        assert_eq!(counts.created, 1);
        assert!(syncer.queue.is_empty());
    }

    #[tokio::test]
    async fn unchanged_record_is_skipped_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let record = employee("1001", "Jane", "Doe", "jane.doe@x.com");
        let syncer = syncer(vec![record.clone()], vec![record], dir.path());

        syncer.run(Instant::now() + Duration::from_secs(10)).await.unwrap();

        let counts = syncer.tracker.counts();
        assert_eq!(counts.processed, 1);
        assert_eq!(counts.skipped, 1);
        assert_eq!(counts.created, 0);
    }

    #[tokio::test]
    async fn validator_repairs_empty_names_before_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let record = employee("1002", "", "Smith", "");
        let syncer = syncer(vec![record], vec![], dir.path());

        syncer.run(Instant::now() + Duration::from_secs(10)).await.unwrap();

        let counts = syncer.tracker.counts();
        assert_eq!(counts.created, 1);
        let events = syncer.tracker.change_events();
        let changes = events[0].changes.as_ref().unwrap();
        assert!(changes.contains_key("first_name") || changes.contains_key("email"));
    }

    #[tokio::test]
    async fn past_deadline_skips_remaining_deltas_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let syncer = syncer(vec![employee("1001", "Jane", "Doe", "jane.doe@x.com")], vec![], dir.path());

        syncer.run(Instant::now() - Duration::from_secs(1)).await.unwrap();

        let counts = syncer.tracker.counts();
        assert_eq!(counts.skipped, 1);
        assert_eq!(counts.created, 0);
    }

    #[tokio::test]
    async fn orphaned_target_record_is_skipped_not_deleted_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let orphan = employee("9999", "Gone", "Fromsource", "gone@x.com");
        let syncer = syncer(vec![], vec![orphan], dir.path());
        assert!(!syncer.deletes_enabled);

        syncer.run(Instant::now() + Duration::from_secs(10)).await.unwrap();

        let counts = syncer.tracker.counts();
        assert_eq!(counts.skipped, 1);
        let events = syncer.tracker.change_events();
        assert_eq!(events[0].reason.as_deref(), Some(ORPHAN_REASON));
    }
}
