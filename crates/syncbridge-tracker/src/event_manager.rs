//! Composes the change tracker and error notifier behind one
//! `record(outcome)` call (spec §4.5): syncers never touch counters,
//! change events, or error windows directly.

use crate::change_tracker::ChangeTracker;
use crate::error_log::{ErrorLog, LoggedError};
use crate::error_window::{ErrorKey, ErrorWindow};
use crate::notifier::Notifier;
use crate::outcome::SyncOutcome;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use syncbridge_core::{ChangeEvent, Notification, NotificationStatus, Operation, SessionCounts};
use uuid::Uuid;

pub struct EventManager {
    change_tracker: ChangeTracker,
    counts: Mutex<SessionCounts>,
    error_window: Mutex<ErrorWindow>,
    error_log: ErrorLog,
    notifier: Arc<dyn Notifier>,
}

impl EventManager {
    pub fn new(session_id: Uuid, output_dir: impl Into<std::path::PathBuf>, notification_cooldown: Duration, notifier: Arc<dyn Notifier>) -> Self {
        let output_dir = output_dir.into();
        Self {
            change_tracker: ChangeTracker::new(session_id, output_dir.clone()),
            counts: Mutex::new(SessionCounts::default()),
            error_window: Mutex::new(ErrorWindow::new(notification_cooldown)),
            error_log: ErrorLog::new(output_dir),
            notifier,
        }
    }

    /// Updates counters, records a [`ChangeEvent`], and — for error
    /// outcomes — updates the rolling error window, sending a
    /// notification when `should_send_notification` says it's due (spec
    /// §4.5). Invariant: `processed == created + updated + skipped +
    /// errors` always holds after this returns (spec §8).
    pub async fn record(&self, outcome: SyncOutcome) -> ChangeEvent {
        {
            let mut counts = self.counts.lock().unwrap();
            counts.processed += 1;
            match outcome.operation {
                Operation::Created => counts.created += 1,
                Operation::Updated => counts.updated += 1,
                Operation::Deleted => counts.updated += 1,
                Operation::Skipped => counts.skipped += 1,
                Operation::Error => counts.errors += 1,
            }
        }

        if let Some(error) = &outcome.error {
            let message = error.to_string();
            self.error_log.append(LoggedError {
                timestamp: Utc::now(),
                error_code: error.code().to_string(),
                entity_type: outcome.entity.entity_type,
                entity_id: outcome.entity.entity_id.clone(),
                message: message.clone(),
            })
            .await;
            self.maybe_notify(error.code(), outcome.entity.entity_type, &outcome.entity.entity_id, &message)
                .await;
        }

        self.change_tracker.record(&outcome).await
    }

    pub fn counts(&self) -> SessionCounts {
        *self.counts.lock().unwrap()
    }

    pub fn change_events(&self) -> Vec<ChangeEvent> {
        self.change_tracker.events()
    }

    async fn maybe_notify(&self, error_code: &'static str, entity_type: syncbridge_core::EntityType, entity_id: &str, message: &str) {
        let key = ErrorKey { error_code, entity_type };
        let now = Utc::now();

        let (should_send, count, sample) = {
            let mut window = self.error_window.lock().unwrap();
            let should_send = window.record(key.clone(), entity_id, now);
            (should_send, window.count(&key), window.sample(&key))
        };

        if !should_send {
            return;
        }

        let notification = Notification {
            id: Uuid::now_v7(),
            kind: error_code.to_string(),
            subject: format!("{error_code} errors for {entity_type}"),
            recipient: String::new(),
            status: NotificationStatus::Pending,
            timestamp: now,
            error: None,
            error_count: count,
        };

        let body = format!("{count} {error_code} errors for {entity_type} since last notice. Latest: {message}. Sample ids: {sample:?}");

        if self.notifier.send(&notification, &body).await.is_ok() {
            self.error_window.lock().unwrap().mark_sent(&key, now);
        }
    }
}
