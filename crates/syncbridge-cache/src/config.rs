//! Configuration for the [`crate::FreshnessManager`].

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CacheManagerConfig {
    /// Prefix applied to every remote-tier key: `<namespace>:<rest>` (spec §6).
    pub namespace: String,
    pub default_ttl: Duration,
    /// Tier-1 (in-process LRU) entry bound.
    pub tier1_capacity: usize,
    /// Tier-3 (on-disk fallback) snapshot directory.
    pub disk_directory: std::path::PathBuf,
}

impl Default for CacheManagerConfig {
    fn default() -> Self {
        Self {
            namespace: "syncbridge".into(),
            default_ttl: Duration::from_secs(6 * 3600),
            tier1_capacity: 1024,
            disk_directory: std::path::PathBuf::from("output/cache"),
        }
    }
}

impl CacheManagerConfig {
    pub fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}
