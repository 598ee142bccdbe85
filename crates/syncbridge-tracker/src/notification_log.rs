//! Decorates a [`crate::Notifier`] with a bounded, queryable history,
//! read by the control plane's `/notifications` endpoint (spec §4.8).
//! `EventManager` hands a fresh [`Notification`] to whichever `Notifier`
//! is configured and otherwise forgets it — this is the one place that
//! history is retained, regardless of whether delivery is SMTP, a
//! webhook, or (in tests) nothing at all.

use crate::notifier::Notifier;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use syncbridge_core::{Notification, NotificationStatus, SyncError};

const CAPACITY: usize = 500;

pub struct NotificationLog {
    inner: std::sync::Arc<dyn Notifier>,
    sent: Mutex<VecDeque<Notification>>,
}

impl NotificationLog {
    pub fn new(inner: std::sync::Arc<dyn Notifier>) -> Self {
        Self { inner, sent: Mutex::new(VecDeque::with_capacity(CAPACITY)) }
    }

    /// Most recent first, optionally filtered by delivery status.
    pub fn recent(&self, status: Option<NotificationStatus>, limit: usize) -> Vec<Notification> {
        let sent = self.sent.lock().unwrap();
        let limit = if limit == 0 { CAPACITY } else { limit };
        sent.iter().rev().filter(|n| status.map_or(true, |s| n.status == s)).take(limit).cloned().collect()
    }

    fn record(&self, mut notification: Notification, status: NotificationStatus) {
        notification.status = status;
        let mut sent = self.sent.lock().unwrap();
        if sent.len() >= CAPACITY {
            sent.pop_front();
        }
        sent.push_back(notification);
    }
}

#[async_trait]
impl Notifier for NotificationLog {
    async fn send(&self, notification: &Notification, body: &str) -> Result<(), SyncError> {
        let result = self.inner.send(notification, body).await;
        self.record(notification.clone(), if result.is_ok() { NotificationStatus::Sent } else { NotificationStatus::Failed });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::RecordingNotifier;
    use chrono::Utc;
    use uuid::Uuid;

    fn notification() -> Notification {
        Notification {
            id: Uuid::now_v7(),
            kind: "transport".to_string(),
            subject: "transport errors".to_string(),
            recipient: "ops@example.com".to_string(),
            status: NotificationStatus::Pending,
            timestamp: Utc::now(),
            error: None,
            error_count: 3,
        }
    }

    #[tokio::test]
    async fn a_successful_send_is_recorded_as_sent() {
        let log = NotificationLog::new(std::sync::Arc::new(RecordingNotifier::new()));
        log.send(&notification(), "body").await.unwrap();

        let recent = log.recent(None, 0);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].status, NotificationStatus::Sent);
    }

    #[tokio::test]
    async fn filtering_by_status_excludes_other_statuses() {
        let log = NotificationLog::new(std::sync::Arc::new(RecordingNotifier::new()));
        log.send(&notification(), "body").await.unwrap();

        assert_eq!(log.recent(Some(NotificationStatus::Sent), 0).len(), 1);
        assert_eq!(log.recent(Some(NotificationStatus::Failed), 0).len(), 0);
    }
}
