//! Drives a `full` sync on a fixed interval (spec §4.7), the way the
//! teacher's `HealthCheckWrapper` drives its background health-check
//! loop: a single spawned task ticking on `tokio::time::interval`, with a
//! stored `JoinHandle` so `stop` can cancel it cleanly.

use crate::controller::SessionController;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use syncbridge_core::SyncType;
use tokio::task::JoinHandle;

pub struct Scheduler {
    controller: Arc<SessionController>,
    sync_interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(controller: Arc<SessionController>, sync_interval: Duration) -> Self {
        Self { controller, sync_interval, task: Mutex::new(None) }
    }

    /// Spawns the background loop. A no-op if already started.
    pub fn start(&self) {
        let mut task = self.task.lock().unwrap();
        if task.is_some() {
            return;
        }

        let controller = Arc::clone(&self.controller);
        let sync_interval = self.sync_interval;
        *task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(sync_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            interval.tick().await; // the first tick fires immediately; the first real cycle waits a full interval

            loop {
                interval.tick().await;
                if controller.is_paused() {
                    continue;
                }
                let _ = controller.trigger_sync(SyncType::Full);
            }
        }));
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syncer::EntitySyncerFactory;
    use async_trait::async_trait;
    use serde_json::Value;
    use syncbridge_adapters::{AdapterKind, DeleteOutcome, EntityAdapter, ListedRecord, WriteOutcome};
    use syncbridge_cache::{CacheManagerConfig, FreshnessManager};
    use syncbridge_core::{EntityType, Settings, SyncError};
    use syncbridge_queue::FailedRecordQueue;
    use syncbridge_tracker::RecordingNotifier;
    use syncbridge_validator::ValidatorConfig;

    struct EmptyAdapter(AdapterKind);

    #[async_trait]
    impl EntityAdapter for EmptyAdapter {
        fn kind(&self) -> AdapterKind {
            self.0
        }

        async fn list_all(&self, _entity_type: EntityType) -> Result<Vec<ListedRecord>, SyncError> {
            Ok(vec![])
        }

        async fn get_by_id(&self, _entity_type: EntityType, _id: &str) -> Result<Option<Value>, SyncError> {
            Ok(None)
        }

        async fn upsert(&self, _entity_type: EntityType, _id: &str, _payload: &Value, _idempotency_key: &str) -> Result<WriteOutcome, SyncError> {
            Ok(WriteOutcome::Created)
        }

        async fn delete(&self, _entity_type: EntityType, _id: &str) -> Result<DeleteOutcome, SyncError> {
            Ok(DeleteOutcome::NotFound)
        }
    }

    fn test_controller(dir: &std::path::Path) -> Arc<SessionController> {
        let factory = EntitySyncerFactory {
            entity_type: EntityType::Employee,
            source: Arc::new(EmptyAdapter(AdapterKind::Erp)),
            target: Arc::new(EmptyAdapter(AdapterKind::Target)),
            cache: Arc::new(FreshnessManager::new(CacheManagerConfig::default())),
            cache_ttl: Duration::from_secs(3600),
            validator_config: ValidatorConfig::from(&Settings::default()),
            queue: Arc::new(FailedRecordQueue::new()),
            deletes_enabled: false,
            entity_concurrency: 4,
        };
        Arc::new(SessionController::new(vec![factory], Arc::new(RecordingNotifier::new()), Duration::from_secs(3600), Duration::from_millis(30), dir, false))
    }

    #[tokio::test]
    async fn ticks_trigger_a_full_sync_until_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let controller = test_controller(dir.path());
        let scheduler = Scheduler::new(Arc::clone(&controller), Duration::from_millis(30));

        scheduler.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.stop();

        assert!(!controller.status().history.is_empty());
    }

    #[tokio::test]
    async fn paused_scheduler_skips_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let controller = test_controller(dir.path());
        controller.pause("operator-1".to_string());
        let scheduler = Scheduler::new(Arc::clone(&controller), Duration::from_millis(30));

        scheduler.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.stop();

        assert!(controller.status().history.is_empty());
    }
}
