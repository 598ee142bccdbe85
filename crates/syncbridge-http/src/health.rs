//! Tracks per-host reachability from the outcome of every call the client
//! sends, read by `/ready` and `/dependencies/health` (SPEC_FULL §3
//! addendum: "owned by the external adapters layer").

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use syncbridge_core::{DependencyHealth, HealthStatus};

/// Consecutive failures at which a dependency is reported `down` rather
/// than merely `degraded`.
const DOWN_THRESHOLD: u32 = 3;

pub struct DependencyHealthRegistry {
    hosts: Mutex<HashMap<String, DependencyHealth>>,
}

impl DependencyHealthRegistry {
    pub fn new() -> Self {
        Self { hosts: Mutex::new(HashMap::new()) }
    }

    pub fn record_success(&self, host: &str) {
        let mut hosts = self.hosts.lock().unwrap();
        hosts.insert(
            host.to_string(),
            DependencyHealth { name: host.to_string(), status: HealthStatus::Up, last_checked: Utc::now(), last_error: None, consecutive_failures: 0 },
        );
    }

    pub fn record_failure(&self, host: &str, error: &str) {
        let mut hosts = self.hosts.lock().unwrap();
        let consecutive_failures = hosts.get(host).map_or(0, |h| h.consecutive_failures) + 1;
        let status = if consecutive_failures >= DOWN_THRESHOLD { HealthStatus::Down } else { HealthStatus::Degraded };
        hosts.insert(
            host.to_string(),
            DependencyHealth { name: host.to_string(), status, last_checked: Utc::now(), last_error: Some(error.to_string()), consecutive_failures },
        );
    }

    pub fn snapshot(&self) -> Vec<DependencyHealth> {
        self.hosts.lock().unwrap().values().cloned().collect()
    }

    /// `/ready` is 503 iff any tracked dependency is `down` (spec §4.8).
    pub fn all_reachable(&self) -> bool {
        self.hosts.lock().unwrap().values().all(|h| h.status != HealthStatus::Down)
    }
}

impl Default for DependencyHealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_consecutive_failures_flip_a_host_down() {
        let registry = DependencyHealthRegistry::new();
        registry.record_failure("target.example.com", "timeout");
        registry.record_failure("target.example.com", "timeout");
        assert!(registry.all_reachable());
        registry.record_failure("target.example.com", "timeout");
        assert!(!registry.all_reachable());
    }

    #[test]
    fn a_later_success_resets_the_failure_streak() {
        let registry = DependencyHealthRegistry::new();
        registry.record_failure("target.example.com", "timeout");
        registry.record_failure("target.example.com", "timeout");
        registry.record_success("target.example.com");
        let snapshot = registry.snapshot();
        assert_eq!(snapshot[0].consecutive_failures, 0);
        assert_eq!(snapshot[0].status, HealthStatus::Up);
    }
}
