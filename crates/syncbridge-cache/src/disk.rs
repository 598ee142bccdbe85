//! Tier 3: on-disk write-ahead snapshot, used only when the remote cache
//! (tier 2) is unreachable (spec §4.2, §6 persistent state layout).
//!
//! One JSON file per key under `directory`, named by a filesystem-safe
//! encoding of the key. Writes are best-effort: a failure here is logged
//! and swallowed, never surfaced to the caller of `get_or_load`.

use crate::entry::CacheEntry;
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct DiskFallback {
    directory: PathBuf,
}

impl DiskFallback {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.directory.join(format!("{safe}.json"))
    }

    pub async fn write(&self, entry: &CacheEntry) {
        let Ok(bytes) = serde_json::to_vec_pretty(entry) else {
            return;
        };
        if tokio::fs::create_dir_all(&self.directory).await.is_err() {
            return;
        }
        let _ = tokio::fs::write(self.path_for(&entry.key), bytes).await;
    }

    pub async fn read(&self, key: &str) -> Option<CacheEntry> {
        let bytes = tokio::fs::read(self.path_for(key)).await.ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub async fn remove(&self, key: &str) {
        let _ = tokio::fs::remove_file(self.path_for(key)).await;
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn roundtrips_an_entry() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = DiskFallback::new(dir.path());
        let entry = CacheEntry::new("employee:all", json!([1, 2, 3]), 3600);

        fallback.write(&entry).await;
        let loaded = fallback.read("employee:all").await.unwrap();
        assert_eq!(loaded.key, entry.key);
        assert_eq!(loaded.value, entry.value);
    }

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = DiskFallback::new(dir.path());
        assert!(fallback.read("nope").await.is_none());
    }
}
