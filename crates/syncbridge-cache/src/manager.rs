//! The Cache & Freshness Manager (spec §4.2): `get_or_load`,
//! `get_with_fallback`, `invalidate`, `refresh`, `stats`.
//!
//! Single-flight is a per-key map of [`tokio::sync::Notify`] handles,
//! adapted from the teacher's coalescing layer
//! (`tower-resilience-coalesce`'s leader/follower shape) but implemented
//! directly against the manager's tiers instead of as a `tower::Service`,
//! since nothing here is a request/response middleware — it's a
//! load-once-per-key KV cache called directly by adapters.

use crate::config::CacheManagerConfig;
use crate::disk::DiskFallback;
use crate::entry::{CacheEntry, CacheEntrySummary};
use crate::error::CacheError;
use crate::eviction::EvictionPolicy;
use crate::events::CacheEvent;
use crate::remote::{InMemoryRemoteCache, RemoteCache};
use crate::store::CacheStore;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use syncbridge_core::{EventListeners, FnListener};

struct Inflight {
    waiters: Mutex<HashMap<String, Arc<tokio::sync::Notify>>>,
}

impl Inflight {
    fn new() -> Self {
        Self {
            waiters: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `None` if the caller becomes the leader for `key` (must run
    /// the loader and call [`Self::finish`]); `Some(notify)` if another
    /// caller is already loading it.
    fn enter(&self, key: &str) -> Option<Arc<tokio::sync::Notify>> {
        let mut waiters = self.waiters.lock().unwrap();
        if let Some(existing) = waiters.get(key) {
            Some(Arc::clone(existing))
        } else {
            waiters.insert(key.to_string(), Arc::new(tokio::sync::Notify::new()));
            None
        }
    }

    fn finish(&self, key: &str) {
        let notify = self.waiters.lock().unwrap().remove(key);
        if let Some(notify) = notify {
            notify.notify_waiters();
        }
    }
}

pub struct FreshnessManager {
    config: CacheManagerConfig,
    tier1: Mutex<CacheStore<String, CacheEntry>>,
    remote: Arc<dyn RemoteCache>,
    disk: DiskFallback,
    inflight: Inflight,
    event_listeners: EventListeners<CacheEvent>,
    stale_serves: Mutex<HashMap<String, u64>>,
    remote_connected: AtomicU64,
}

impl FreshnessManager {
    pub fn new(config: CacheManagerConfig) -> Self {
        let disk = DiskFallback::new(config.disk_directory.clone());
        Self {
            tier1: Mutex::new(CacheStore::new(config.tier1_capacity, None, EvictionPolicy::Lru)),
            remote: Arc::new(InMemoryRemoteCache::new()),
            disk,
            inflight: Inflight::new(),
            event_listeners: EventListeners::new(),
            stale_serves: Mutex::new(HashMap::new()),
            remote_connected: AtomicU64::new(1),
            config,
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteCache>) -> Self {
        self.remote = remote;
        self
    }

    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    fn emit(&self, event: CacheEvent) {
        self.event_listeners.emit(&event);
    }

    /// Reads tier 1 only, returning the value if present and not stale.
    fn read_fresh_tier1(&self, key: &str) -> Option<CacheEntry> {
        let mut tier1 = self.tier1.lock().unwrap();
        let entry = tier1.get(&key.to_string())?;
        if entry.is_stale(chrono::Utc::now()) {
            None
        } else {
            Some(entry)
        }
    }

    /// Reads tier 1 regardless of staleness — used by `get_with_fallback`.
    fn read_any_tier1(&self, key: &str) -> Option<CacheEntry> {
        self.tier1.lock().unwrap().get(&key.to_string())
    }

    async fn read_remote(&self, key: &str) -> Option<CacheEntry> {
        let namespaced = self.config.namespaced(key);
        match self.remote.get(&namespaced).await {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).ok(),
            Ok(None) => None,
            Err(_) => {
                self.emit(CacheEvent::RemoteUnavailable {
                    key: key.to_string(),
                    timestamp: Instant::now(),
                });
                self.disk.read(key).await
            }
        }
    }

    async fn write_all_tiers(&self, entry: &CacheEntry) {
        self.tier1
            .lock()
            .unwrap()
            .insert(entry.key.clone(), entry.clone());

        let namespaced = self.config.namespaced(&entry.key);
        let ttl = Duration::from_secs(entry.ttl_seconds);
        if let Ok(bytes) = serde_json::to_vec(entry) {
            if self.remote.set(&namespaced, bytes, ttl).await.is_err() {
                self.emit(CacheEvent::RemoteUnavailable {
                    key: entry.key.clone(),
                    timestamp: Instant::now(),
                });
            }
        }
        // Tier 3 is always written best-effort, independent of tier 2's
        // outcome, so a later remote outage still has a fallback to read.
        self.disk.write(entry).await;
    }

    /// Returns the cached value if fresh; otherwise invokes `loader` exactly
    /// once across concurrent callers, stores the result, and returns it.
    pub async fn get_or_load<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> Result<serde_json::Value, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<serde_json::Value, String>>,
    {
        if let Some(entry) = self.read_fresh_tier1(key) {
            self.emit(CacheEvent::Hit {
                key: key.to_string(),
                timestamp: Instant::now(),
            });
            return Ok(entry.value);
        }
        if let Some(entry) = self.read_remote(key).await {
            if !entry.is_stale(chrono::Utc::now()) {
                self.tier1.lock().unwrap().insert(key.to_string(), entry.clone());
                self.emit(CacheEvent::Hit {
                    key: key.to_string(),
                    timestamp: Instant::now(),
                });
                return Ok(entry.value);
            }
        }

        self.emit(CacheEvent::Miss {
            key: key.to_string(),
            timestamp: Instant::now(),
        });

        if let Some(notify) = self.inflight.enter(key) {
            notify.notified().await;
            if let Some(entry) = self.read_fresh_tier1(key) {
                return Ok(entry.value);
            }
            return Err(CacheError::LoaderFailed(
                "in-flight load for this key failed".into(),
            ));
        }

        let result = loader().await;
        self.inflight.finish(key);

        match result {
            Ok(value) => {
                let entry = CacheEntry::new(key, value.clone(), ttl.as_secs());
                self.write_all_tiers(&entry).await;
                Ok(value)
            }
            Err(message) => {
                self.emit(CacheEvent::LoaderFailed {
                    key: key.to_string(),
                    timestamp: Instant::now(),
                    message: message.clone(),
                });
                Err(CacheError::LoaderFailed(message))
            }
        }
    }

    /// Same contract as [`Self::get_or_load`], but on loader failure falls
    /// back to the last-known value (even stale) rather than propagating
    /// the error, as long as one exists and is no older than `max_age`.
    pub async fn get_with_fallback<F, Fut>(
        &self,
        key: &str,
        max_age: Duration,
        loader: F,
    ) -> Result<serde_json::Value, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<serde_json::Value, String>>,
    {
        match self.get_or_load(key, max_age, loader).await {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Some(entry) = self.read_any_tier1(key) {
                    self.note_stale_serve(key);
                    self.emit(CacheEvent::StaleServed {
                        key: key.to_string(),
                        timestamp: Instant::now(),
                    });
                    return Ok(entry.value);
                }
                if let Some(entry) = self.disk.read(key).await {
                    self.note_stale_serve(key);
                    self.emit(CacheEvent::StaleServed {
                        key: key.to_string(),
                        timestamp: Instant::now(),
                    });
                    return Ok(entry.value);
                }
                Err(err)
            }
        }
    }

    fn note_stale_serve(&self, key: &str) {
        *self.stale_serves.lock().unwrap().entry(key.to_string()).or_insert(0) += 1;
    }

    /// `invalidate("all")` clears every tier; otherwise just `key`.
    pub async fn invalidate(&self, key: &str) {
        if key == "all" {
            self.tier1.lock().unwrap().clear();
            let _ = self.remote.clear().await;
            return;
        }
        // Tier 1 has no direct remove; force the entry stale so every
        // freshness check treats it as a miss, then drop tiers 2 and 3.
        self.force_stale(key);
        let namespaced = self.config.namespaced(key);
        let _ = self.remote.delete(&namespaced).await;
        self.disk.remove(key).await;
        self.emit(CacheEvent::Invalidated {
            key: key.to_string(),
            timestamp: Instant::now(),
        });
    }

    fn force_stale(&self, key: &str) {
        let mut tier1 = self.tier1.lock().unwrap();
        if let Some(mut entry) = tier1.get(&key.to_string()) {
            entry.refreshed_at = chrono::Utc::now() - chrono::Duration::seconds(entry.ttl_seconds as i64 + 1);
            tier1.insert(key.to_string(), entry);
        }
    }

    /// Marks `key` stale so the next `get_or_load`/`get_with_fallback` call
    /// reloads it, without discarding the fallback value tiers 1/3 hold.
    pub fn refresh(&self, key: &str) {
        self.force_stale(key);
        self.emit(CacheEvent::Refreshed {
            key: key.to_string(),
            timestamp: Instant::now(),
        });
    }

    pub async fn stats(&self) -> CacheStats {
        let redis_connected = self.remote.is_connected().await;
        let snapshot = self.tier1.lock().unwrap().snapshot();
        let stale_serves = self.stale_serves.lock().unwrap();
        CacheStats {
            redis_connected,
            cache_ttl_hours: self.config.default_ttl.as_secs() / 3600,
            caches: snapshot
                .into_iter()
                .map(|(key, entry)| {
                    let summary = CacheEntrySummary {
                        key: entry.key.clone(),
                        size_bytes: entry.size_bytes,
                        ttl_seconds: entry.ttl_seconds,
                        refreshed_at: entry.refreshed_at,
                        is_stale: entry.is_stale(chrono::Utc::now()),
                        stale_serves: *stale_serves.get(&key).unwrap_or(&0),
                        item_count: entry.value.as_array().map(|a| a.len() as u64),
                    };
                    (key, summary)
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub redis_connected: bool,
    pub cache_ttl_hours: u64,
    pub caches: HashMap<String, CacheEntrySummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn manager() -> FreshnessManager {
        let dir = tempfile::tempdir().unwrap();
        FreshnessManager::new(CacheManagerConfig {
            disk_directory: dir.keep(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn loader_invoked_exactly_once_across_concurrent_callers() {
        let manager = Arc::new(manager());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let manager = Arc::clone(&manager);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                manager
                    .get_or_load("employees:all", Duration::from_secs(60), || {
                        let calls = Arc::clone(&calls);
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok(json!([1, 2, 3]))
                        }
                    })
                    .await
            }));
        }

        for handle in handles {
            let value = handle.await.unwrap().unwrap();
            assert_eq!(value, json!([1, 2, 3]));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fresh_value_short_circuits_the_loader() {
        let manager = manager();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            manager
                .get_or_load("vehicles:all", Duration::from_secs(60), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!([]))
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_loader_does_not_poison_existing_value() {
        let manager = manager();
        manager
            .get_or_load("sites:all", Duration::from_millis(10), || async move {
                Ok(json!({"ok": true}))
            })
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;

        let result = manager
            .get_with_fallback("sites:all", Duration::from_secs(600), || async move {
                Err("upstream down".to_string())
            })
            .await
            .unwrap();
        assert_eq!(result, json!({"ok": true}));
    }

    #[tokio::test]
    async fn get_with_fallback_propagates_error_with_no_prior_value() {
        let manager = manager();
        let result = manager
            .get_with_fallback("new-key", Duration::from_secs(600), || async move {
                Err("no data yet".to_string())
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn invalidate_forces_a_reload() {
        let manager = manager();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            manager
                .get_or_load("departments:all", Duration::from_secs(600), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!([]))
                })
                .await
                .unwrap();
            manager.invalidate("departments:all").await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refresh_marks_stale_without_dropping_fallback() {
        let manager = manager();
        manager
            .get_or_load("titles:all", Duration::from_secs(600), || async move {
                Ok(json!(["lead"]))
            })
            .await
            .unwrap();

        manager.refresh("titles:all");

        let result = manager
            .get_with_fallback("titles:all", Duration::from_secs(600), || async move {
                Err("transient".to_string())
            })
            .await
            .unwrap();
        assert_eq!(result, json!(["lead"]));
    }
}
