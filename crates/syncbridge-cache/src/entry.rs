//! The `CacheEntry` data model (spec §3) and its canonical key schema.
//!
//! The spec's Open Question about coexisting `size`/`size_bytes` and
//! `ttl_remaining`/`ttl_seconds` field names is resolved in favor of the
//! canonical `size_bytes`/`ttl_seconds` names only (SPEC_FULL §9); there is
//! no dashboard consumer in this core to keep a compatibility shim for.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The shape of the cached value, mirroring what a remote KV store like
/// Redis would report back for the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    String,
    List,
    Set,
    Hash,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub value: Value,
    pub key_type: KeyType,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub refreshed_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    pub last_updated: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, value: Value, ttl_seconds: u64) -> Self {
        let now = Utc::now();
        let size_bytes = serde_json::to_vec(&value).map(|b| b.len() as u64).unwrap_or(0);
        Self {
            key: key.into(),
            value,
            key_type: KeyType::String,
            size_bytes,
            created_at: now,
            refreshed_at: now,
            ttl_seconds: ttl_seconds.max(1),
            last_updated: now,
        }
    }

    /// `refreshed_at + ttl_seconds < now` — stale but still servable as a
    /// fallback (spec §3 invariant).
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.refreshed_at + chrono::Duration::seconds(self.ttl_seconds as i64) < now
    }

    pub fn touch_refreshed(&mut self, value: Value) {
        let now = Utc::now();
        self.size_bytes = serde_json::to_vec(&value).map(|b| b.len() as u64).unwrap_or(0);
        self.value = value;
        self.refreshed_at = now;
        self.last_updated = now;
    }
}

/// Summary returned by `stats()` for one cache key (spec §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntrySummary {
    pub key: String,
    pub size_bytes: u64,
    pub ttl_seconds: u64,
    pub refreshed_at: DateTime<Utc>,
    pub is_stale: bool,
    pub stale_serves: u64,
    /// Element count when the cached value is a JSON array (the shape
    /// every `<namespace>:<entity_type>:all` listing takes); `None`
    /// otherwise. Backs `GET /entities/counts`.
    pub item_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fresh_entry_is_not_stale() {
        let entry = CacheEntry::new("k", json!({"a": 1}), 3600);
        assert!(!entry.is_stale(Utc::now()));
    }

    #[test]
    fn stale_after_ttl_elapses() {
        let mut entry = CacheEntry::new("k", json!(1), 1);
        entry.refreshed_at = Utc::now() - chrono::Duration::seconds(10);
        assert!(entry.is_stale(Utc::now()));
    }
}
