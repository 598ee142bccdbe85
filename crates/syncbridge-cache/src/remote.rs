//! Tier 2: the shared remote cache (spec §4.2 storage tiers).
//!
//! `RemoteCache` is a small trait rather than a concrete Redis type so
//! `syncbridge-engine`'s tests can substitute an in-memory fake without a
//! live Redis instance, matching the teacher's event-listener-over-trait
//! style of keeping I/O behind a narrow seam.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[async_trait]
pub trait RemoteCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, String>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), String>;
    async fn delete(&self, key: &str) -> Result<(), String>;
    async fn clear(&self) -> Result<(), String>;
    async fn is_connected(&self) -> bool;
}

/// An in-process stand-in for the remote cache, used in tests and as the
/// default when no `remote_cache_url` is configured.
#[derive(Default)]
pub struct InMemoryRemoteCache {
    store: Mutex<HashMap<String, Vec<u8>>>,
    connected: std::sync::atomic::AtomicBool,
}

impl InMemoryRemoteCache {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
            connected: std::sync::atomic::AtomicBool::new(true),
        }
    }

    /// Test hook simulating the remote going unreachable.
    pub fn set_connected(&self, connected: bool) {
        self.connected
            .store(connected, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteCache for InMemoryRemoteCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, String> {
        if !self.connected.load(std::sync::atomic::Ordering::SeqCst) {
            return Err("remote cache unreachable".into());
        }
        Ok(self.store.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>, _ttl: Duration) -> Result<(), String> {
        if !self.connected.load(std::sync::atomic::Ordering::SeqCst) {
            return Err("remote cache unreachable".into());
        }
        self.store.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        self.store.lock().unwrap().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), String> {
        self.store.lock().unwrap().clear();
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// Redis-backed [`RemoteCache`], built on a `ConnectionManager` so transient
/// disconnects are retried by the `redis` crate itself rather than by us.
#[cfg(feature = "redis-remote")]
pub struct RedisRemoteCache {
    manager: redis::aio::ConnectionManager,
}

#[cfg(feature = "redis-remote")]
impl RedisRemoteCache {
    pub async fn connect(url: &str) -> Result<Self, String> {
        let client = redis::Client::open(url).map_err(|e| e.to_string())?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| e.to_string())?;
        Ok(Self { manager })
    }
}

#[cfg(feature = "redis-remote")]
#[async_trait]
impl RemoteCache for RedisRemoteCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, String> {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        conn.get(key).await.map_err(|e| e.to_string())
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), String> {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
            .map_err(|e| e.to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key).await.map_err(|e| e.to_string())
    }

    async fn clear(&self) -> Result<(), String> {
        Err("bulk clear not supported against a shared redis namespace".into())
    }

    async fn is_connected(&self) -> bool {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        conn.get::<_, Option<Vec<u8>>>("__syncbridge_ping__")
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_roundtrips() {
        let remote = InMemoryRemoteCache::new();
        remote.set("k", b"v".to_vec(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(remote.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn disconnect_fails_reads_and_writes() {
        let remote = InMemoryRemoteCache::new();
        remote.set("k", b"v".to_vec(), Duration::from_secs(60)).await.unwrap();
        remote.set_connected(false);
        assert!(remote.get("k").await.is_err());
        assert!(!remote.is_connected().await);
    }
}
