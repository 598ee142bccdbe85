//! Rolling error window keyed by `(error_code, entity_type)` (spec §4.5):
//! tracks counts and a bounded sample of affected ids, and decides when a
//! cooldown has elapsed enough to emit a fresh [`Notification`].

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use syncbridge_core::EntityType;

const DEFAULT_SAMPLE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorKey {
    pub error_code: &'static str,
    pub entity_type: EntityType,
}

#[derive(Debug, Clone, Default)]
struct WindowEntry {
    count: u64,
    sample_ids: Vec<String>,
    last_sent_at: Option<DateTime<Utc>>,
    new_since_last_send: u64,
}

pub struct ErrorWindow {
    cooldown: Duration,
    sample_size: usize,
    entries: HashMap<ErrorKey, WindowEntry>,
}

impl ErrorWindow {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            sample_size: DEFAULT_SAMPLE_SIZE,
            entries: HashMap::new(),
        }
    }

    /// Records one occurrence and returns `true` iff a notification should
    /// be sent now: there are new errors since the last send *and* the
    /// cooldown has elapsed (spec §4.5's `should_send_notification`).
    pub fn record(&mut self, key: ErrorKey, entity_id: &str, now: DateTime<Utc>) -> bool {
        let sample_size = self.sample_size;
        let entry = self.entries.entry(key).or_default();
        entry.count += 1;
        entry.new_since_last_send += 1;
        if entry.sample_ids.len() < sample_size {
            entry.sample_ids.push(entity_id.to_string());
        }

        let cooldown_elapsed = match entry.last_sent_at {
            None => true,
            Some(last) => now.signed_duration_since(last).to_std().unwrap_or_default() >= self.cooldown,
        };

        entry.new_since_last_send > 0 && cooldown_elapsed
    }

    /// Marks a key as notified as of `now`, resetting its "new since last
    /// send" counter so the next `record` call starts a fresh cooldown.
    pub fn mark_sent(&mut self, key: &ErrorKey, now: DateTime<Utc>) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_sent_at = Some(now);
            entry.new_since_last_send = 0;
        }
    }

    pub fn count(&self, key: &ErrorKey) -> u64 {
        self.entries.get(key).map(|e| e.count).unwrap_or(0)
    }

    pub fn sample(&self, key: &ErrorKey) -> Vec<String> {
        self.entries.get(key).map(|e| e.sample_ids.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ErrorKey {
        ErrorKey { error_code: "transport", entity_type: EntityType::Employee }
    }

    #[test]
    fn first_error_is_eligible_to_notify_immediately() {
        let mut window = ErrorWindow::new(Duration::from_secs(3600));
        assert!(window.record(key(), "emp-1", Utc::now()));
    }

    #[test]
    fn repeat_errors_within_cooldown_after_sending_are_not_eligible() {
        let mut window = ErrorWindow::new(Duration::from_secs(3600));
        let t0 = Utc::now();
        assert!(window.record(key(), "emp-1", t0));
        window.mark_sent(&key(), t0);

        let t1 = t0 + chrono::Duration::seconds(10);
        assert!(!window.record(key(), "emp-2", t1));
    }

    #[test]
    fn errors_after_cooldown_elapses_are_eligible_again() {
        let mut window = ErrorWindow::new(Duration::from_secs(60));
        let t0 = Utc::now();
        window.record(key(), "emp-1", t0);
        window.mark_sent(&key(), t0);

        let t1 = t0 + chrono::Duration::seconds(120);
        assert!(window.record(key(), "emp-2", t1));
    }

    #[test]
    fn sample_is_capped_at_the_configured_size() {
        let mut window = ErrorWindow::new(Duration::from_secs(1));
        for i in 0..20 {
            window.record(key(), &format!("emp-{i}"), Utc::now());
        }
        assert_eq!(window.sample(&key()).len(), DEFAULT_SAMPLE_SIZE);
        assert_eq!(window.count(&key()), 20);
    }
}
