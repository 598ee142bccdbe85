//! In-memory audit trail (spec §4.8: "all writes produce an `AuditEntry`"),
//! the same bounded-ring-buffer shape as `syncbridge-http`'s `ApiCallLog`
//! and `syncbridge-tracker`'s `NotificationLog` — every control-plane write
//! handler shares one `AuditLog` and appends before responding.

use std::collections::VecDeque;
use std::sync::Mutex;
use syncbridge_core::{AuditAction, AuditEntry};
use uuid::Uuid;

const CAPACITY: usize = 2000;

pub struct AuditLog {
    entries: Mutex<VecDeque<AuditEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self { entries: Mutex::new(VecDeque::with_capacity(CAPACITY)) }
    }

    pub fn record(&self, user: &str, action: AuditAction, resource: impl Into<String>, details: Option<serde_json::Value>) {
        let entry = AuditEntry {
            id: Uuid::now_v7(),
            timestamp: chrono::Utc::now(),
            user: user.to_string(),
            ip_address: None,
            action,
            resource: resource.into(),
            details,
        };
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= CAPACITY {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Most recent first, optionally filtered by action.
    pub fn recent(&self, action: Option<AuditAction>, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.lock().unwrap();
        let limit = if limit == 0 { CAPACITY } else { limit };
        entries.iter().rev().filter(|e| action.map_or(true, |a| e.action == a)).take(limit).cloned().collect()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_then_filtering_by_action_excludes_other_actions() {
        let log = AuditLog::new();
        log.record("operator-1", AuditAction::PauseSync, "sync", None);
        log.record("operator-1", AuditAction::CacheRefresh, "employees:all", None);

        assert_eq!(log.recent(Some(AuditAction::PauseSync), 0).len(), 1);
        assert_eq!(log.recent(None, 0).len(), 2);
    }

    #[test]
    fn ring_buffer_drops_oldest_past_capacity() {
        let log = AuditLog::new();
        for i in 0..CAPACITY + 5 {
            log.record("operator-1", AuditAction::Export, format!("report-{i}"), None);
        }
        let all = log.recent(None, 0);
        assert_eq!(all.len(), CAPACITY);
        assert_eq!(all[0].resource, format!("report-{}", CAPACITY + 4));
    }
}
