//! Cache & freshness manager (spec §4.2).
//!
//! Three storage tiers sit behind a single-flight loader:
//!
//! - **Tier 1**: in-process LRU, adapted from the teacher's generic
//!   `EvictionStore` engine (`store.rs`/`eviction.rs`).
//! - **Tier 2**: a pluggable [`RemoteCache`] — Redis in production, an
//!   in-memory fake in tests.
//! - **Tier 3**: on-disk JSON snapshots, read only when tiers 1 and 2 both
//!   miss or are unavailable.
//!
//! # Examples
//!
//! ```no_run
//! use syncbridge_cache::{CacheManagerConfig, FreshnessManager};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = FreshnessManager::new(CacheManagerConfig::default());
//! let value = manager
//!     .get_or_load("employees:all", Duration::from_secs(3600), || async move {
//!         Ok(json!([]))
//!     })
//!     .await?;
//! # let _ = value;
//! # Ok(())
//! # }
//! ```

mod config;
mod disk;
mod entry;
mod error;
mod events;
mod eviction;
mod manager;
mod remote;
mod store;

pub use config::CacheManagerConfig;
pub use entry::{CacheEntry, CacheEntrySummary, KeyType};
pub use error::CacheError;
pub use events::CacheEvent;
pub use manager::{CacheStats, FreshnessManager};
pub use remote::{InMemoryRemoteCache, RemoteCache};

#[cfg(feature = "redis-remote")]
pub use remote::RedisRemoteCache;

pub use disk::DiskFallback;
