//! The session controller (spec §4.7): accepts a trigger, builds one
//! `EventManager` shared by every entity type in the run, dispatches
//! syncers in `EntityType::SYNC_ORDER`, and serializes sessions so at
//! most one runs at a time — which also satisfies spec §3's per-`sync_type`
//! and global-`full` cardinality invariants for free, since there is never
//! more than one session of any kind running.

use crate::mapping::entities_for;
use crate::syncer::EntitySyncerFactory;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use syncbridge_core::{EntityType, PauseState, SessionStatus, SyncError, SyncSession, SyncType};
use syncbridge_queue::Resync;
use syncbridge_tracker::{EventManager, Notifier};
use tokio::time::Instant;
use uuid::Uuid;

/// Fraction of `sync_interval` a session gets before remaining deltas are
/// recorded as `skipped` instead of written (spec §5).
const DEADLINE_FRACTION: f64 = 0.8;

/// How many sessions' worth of history `/sync/status` can look back on.
const HISTORY_BOUND: usize = 50;

/// How many triggers can queue behind a running session before a new one
/// is rejected outright (spec §4.7: "queue up to a small bound").
const PENDING_BOUND: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// No session was running; this one started immediately.
    Started,
    /// A session was already running; this trigger is queued (or was
    /// already queued for the same `sync_type` — coalesced, not
    /// duplicated).
    Queued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TriggerError {
    #[error("sync is paused")]
    Paused,
    #[error("too many sync triggers are already queued")]
    QueueFull,
}

/// A read-only view of the controller's state, for `/sync/trigger/status`
/// and `/health`.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub paused: bool,
    pub paused_by: Option<String>,
    pub paused_at: Option<DateTime<Utc>>,
    pub current: Option<SyncType>,
    pub last_session: Option<SyncSession>,
    pub history: Vec<SyncSession>,
}

pub struct SessionController {
    factories: HashMap<EntityType, EntitySyncerFactory>,
    notifier: Arc<dyn Notifier>,
    notification_cooldown: Duration,
    sync_interval: Duration,
    output_dir: PathBuf,
    pause: Mutex<PauseState>,
    current: Mutex<Option<SyncType>>,
    pending: Mutex<VecDeque<SyncType>>,
    history: Mutex<VecDeque<SyncSession>>,
}

impl SessionController {
    pub fn new(
        factories: Vec<EntitySyncerFactory>,
        notifier: Arc<dyn Notifier>,
        notification_cooldown: Duration,
        sync_interval: Duration,
        output_dir: impl Into<PathBuf>,
        pause_default: bool,
    ) -> Self {
        Self {
            factories: factories.into_iter().map(|f| (f.entity_type, f)).collect(),
            notifier,
            notification_cooldown,
            sync_interval,
            output_dir: output_dir.into(),
            pause: Mutex::new(PauseState { paused: pause_default, paused_by: None, paused_at: None }),
            current: Mutex::new(None),
            pending: Mutex::new(VecDeque::new()),
            history: Mutex::new(VecDeque::new()),
        }
    }

    /// Exposes one entity type's source/target adapters and cache handle
    /// to callers outside the session lifecycle — `syncbridge-control`'s
    /// `/diff/{entity_type}/{entity_id}` endpoint (spec §4.8) needs direct
    /// adapter reads that don't belong to any particular session.
    pub fn factory(&self, entity_type: EntityType) -> Option<&EntitySyncerFactory> {
        self.factories.get(&entity_type)
    }

    pub fn is_paused(&self) -> bool {
        self.pause.lock().unwrap().paused
    }

    pub fn pause(&self, by: String) -> PauseState {
        let mut pause = self.pause.lock().unwrap();
        pause.paused = true;
        pause.paused_by = Some(by);
        pause.paused_at = Some(Utc::now());
        pause.clone()
    }

    pub fn resume(&self) -> PauseState {
        let mut pause = self.pause.lock().unwrap();
        pause.paused = false;
        pause.clone()
    }

    pub fn status(&self) -> SessionSnapshot {
        let pause = self.pause.lock().unwrap().clone();
        let history = self.history.lock().unwrap();
        SessionSnapshot {
            paused: pause.paused,
            paused_by: pause.paused_by,
            paused_at: pause.paused_at,
            current: *self.current.lock().unwrap(),
            last_session: history.front().cloned(),
            history: history.iter().cloned().collect(),
        }
    }

    /// Accepts a trigger from the scheduler or the control plane (spec
    /// §4.7). Returns quickly: the session itself runs on a spawned task,
    /// so a caller driving this from an HTTP handler can answer `202`
    /// without waiting on a full sync cycle.
    pub fn trigger_sync(self: &Arc<Self>, sync_type: SyncType) -> Result<TriggerOutcome, TriggerError> {
        if self.is_paused() {
            return Err(TriggerError::Paused);
        }

        let mut current = self.current.lock().unwrap();
        if current.is_none() {
            *current = Some(sync_type);
            drop(current);
            self.spawn(sync_type);
            return Ok(TriggerOutcome::Started);
        }
        drop(current);

        let mut pending = self.pending.lock().unwrap();
        if pending.contains(&sync_type) {
            return Ok(TriggerOutcome::Queued);
        }
        if pending.len() >= PENDING_BOUND {
            return Err(TriggerError::QueueFull);
        }
        pending.push_back(sync_type);
        Ok(TriggerOutcome::Queued)
    }

    /// Runs one session to completion and returns it, bypassing the
    /// trigger/queue machinery. Exposed for tests and for a caller that
    /// genuinely wants to block on a run (e.g. a `--once` CLI mode).
    pub async fn run_once(&self, sync_type: SyncType) -> SyncSession {
        self.run_with_id(Uuid::now_v7(), sync_type).await
    }

    fn spawn(self: &Arc<Self>, sync_type: SyncType) {
        let this = Arc::clone(self);
        let session_id = Uuid::now_v7();
        tokio::spawn(async move { this.execute(session_id, sync_type).await });
    }

    async fn execute(self: Arc<Self>, session_id: Uuid, sync_type: SyncType) {
        let session = self.run_with_id(session_id, sync_type).await;
        self.record_history(session);

        let next = self.pending.lock().unwrap().pop_front();
        *self.current.lock().unwrap() = next;
        if let Some(next_type) = next {
            self.spawn(next_type);
        }
    }

    fn record_history(&self, session: SyncSession) {
        let mut history = self.history.lock().unwrap();
        history.push_front(session);
        history.truncate(HISTORY_BOUND);
    }

    async fn run_with_id(&self, session_id: Uuid, sync_type: SyncType) -> SyncSession {
        let mut session = SyncSession {
            session_id,
            sync_type,
            started_at: Utc::now(),
            ended_at: None,
            status: SessionStatus::Running,
            counts: Default::default(),
        };

        let tracker = Arc::new(EventManager::new(session_id, &self.output_dir, self.notification_cooldown, self.notifier.clone()));
        let deadline = Instant::now() + self.sync_interval.mul_f64(DEADLINE_FRACTION);

        let mut failed = false;
        for entity_type in entities_for(sync_type) {
            let Some(factory) = self.factories.get(&entity_type) else { continue };
            let syncer = factory.build(tracker.clone());
            if syncer.run(deadline).await.is_err() {
                failed = true;
                break;
            }
        }

        session.counts = tracker.counts();
        session.ended_at = Some(Utc::now());
        session.status = if failed { SessionStatus::Failed } else { SessionStatus::Completed };
        session
    }
}

/// Routes `FailedRecordQueue::retry`/`retry_all` back to whichever
/// entity type's syncer owns the record (spec §4.6) — a single shared
/// queue spans every entity type, but a [`crate::syncer::EntitySyncer`]
/// only knows how to resync its own. Runs outside any session: it builds
/// a throwaway tracker so the resync still produces a `ChangeEvent`
/// (visible in `/audit`, not session `/sync/trigger/status` history).
#[async_trait]
impl Resync for SessionController {
    async fn resync(&self, entity_type: EntityType, entity_id: &str) -> Result<(), SyncError> {
        let factory = self
            .factories
            .get(&entity_type)
            .ok_or_else(|| SyncError::Internal { message: format!("no syncer configured for {entity_type}") })?;
        let tracker = Arc::new(EventManager::new(Uuid::now_v7(), &self.output_dir, self.notification_cooldown, self.notifier.clone()));
        let syncer = factory.build(tracker);
        syncer.resync_one(entity_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syncer::EntitySyncerFactory;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use syncbridge_adapters::{AdapterKind, DeleteOutcome, EntityAdapter, ListedRecord, WriteOutcome};
    use syncbridge_cache::{CacheManagerConfig, FreshnessManager};
    use syncbridge_core::{Settings, SyncError};
    use syncbridge_queue::FailedRecordQueue;
    use syncbridge_tracker::RecordingNotifier;
    use syncbridge_validator::ValidatorConfig;

    struct FakeAdapter {
        kind: AdapterKind,
        delay: Duration,
        records: std::sync::Mutex<Vec<ListedRecord>>,
    }

    impl FakeAdapter {
        fn new(kind: AdapterKind, records: Vec<ListedRecord>, delay: Duration) -> Self {
            Self { kind, delay, records: std::sync::Mutex::new(records) }
        }
    }

    #[async_trait]
    impl EntityAdapter for FakeAdapter {
        fn kind(&self) -> AdapterKind {
            self.kind
        }

        async fn list_all(&self, _entity_type: EntityType) -> Result<Vec<ListedRecord>, SyncError> {
            tokio::time::sleep(self.delay).await;
            Ok(self.records.lock().unwrap().clone())
        }

        async fn get_by_id(&self, _entity_type: EntityType, id: &str) -> Result<Option<Value>, SyncError> {
            Ok(self.records.lock().unwrap().iter().find(|r| r.id == id).map(|r| r.payload.clone()))
        }

        async fn upsert(&self, _entity_type: EntityType, id: &str, payload: &Value, _idempotency_key: &str) -> Result<WriteOutcome, SyncError> {
            let mut records = self.records.lock().unwrap();
            match records.iter_mut().find(|r| r.id == id) {
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

    fn employee(id: &str) -> ListedRecord {
        ListedRecord { id: id.to_string(), payload: json!({"id": id, "first_name": "Jane", "last_name": "Doe", "email": "jane.doe@x.com"}) }
    }

    fn factory(delay: Duration) -> EntitySyncerFactory {
        EntitySyncerFactory {
            entity_type: EntityType::Employee,
            source: Arc::new(FakeAdapter::new(AdapterKind::Erp, vec![employee("1001")], delay)),
            target: Arc::new(FakeAdapter::new(AdapterKind::Target, vec![], Duration::ZERO)),
            cache: Arc::new(FreshnessManager::new(CacheManagerConfig::default())),
            cache_ttl: Duration::from_secs(3600),
            validator_config: ValidatorConfig::from(&Settings::default()),
            queue: Arc::new(FailedRecordQueue::new()),
            deletes_enabled: false,
            entity_concurrency: 4,
        }
    }

    fn test_controller(delay: Duration, dir: &std::path::Path) -> Arc<SessionController> {
        Arc::new(SessionController::new(
            vec![factory(delay)],
            Arc::new(RecordingNotifier::new()),
            Duration::from_secs(3600),
            Duration::from_secs(60),
            dir,
            false,
        ))
    }

    #[tokio::test]
    async fn idle_trigger_starts_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let controller = test_controller(Duration::ZERO, dir.path());
        assert_eq!(controller.trigger_sync(SyncType::Employees), Ok(TriggerOutcome::Started));
    }

    #[tokio::test]
    async fn paused_trigger_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let controller = test_controller(Duration::ZERO, dir.path());
        controller.pause("operator-1".to_string());
        assert_eq!(controller.trigger_sync(SyncType::Employees), Err(TriggerError::Paused));
    }

    #[tokio::test]
    async fn second_trigger_while_running_is_queued_not_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let controller = test_controller(Duration::from_millis(50), dir.path());

        assert_eq!(controller.trigger_sync(SyncType::Employees), Ok(TriggerOutcome::Started));
        assert_eq!(controller.trigger_sync(SyncType::Employees), Ok(TriggerOutcome::Queued));
        assert_eq!(controller.status().current, Some(SyncType::Employees));
    }

    #[tokio::test]
    async fn run_once_produces_a_completed_session_with_matching_counts() {
        let dir = tempfile::tempdir().unwrap();
        let controller = test_controller(Duration::ZERO, dir.path());

        let session = controller.run_once(SyncType::Employees).await;

        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.counts.processed, 1);
        assert_eq!(session.counts.created, 1);
    }

    #[tokio::test]
    async fn resume_clears_the_paused_flag() {
        let dir = tempfile::tempdir().unwrap();
        let controller = test_controller(Duration::ZERO, dir.path());
        controller.pause("operator-1".to_string());
        assert!(controller.is_paused());
        controller.resume();
        assert!(!controller.is_paused());
    }

    #[tokio::test]
    async fn resync_routes_to_the_syncer_owning_that_entity_type() {
        let dir = tempfile::tempdir().unwrap();
        let controller = test_controller(Duration::ZERO, dir.path());

        controller.resync(EntityType::Employee, "1001").await.unwrap();

        let err = controller.resync(EntityType::Vehicle, "v1").await.unwrap_err();
        assert!(matches!(err, SyncError::Internal { .. }));
    }
}
