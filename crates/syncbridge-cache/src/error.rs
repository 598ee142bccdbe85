//! Cache-layer errors. Converts into [`syncbridge_core::SyncError`] so
//! callers upstream of the cache see the shared taxonomy (spec §7).

use std::fmt;
use syncbridge_core::SyncError;

#[derive(Debug, Clone)]
pub enum CacheError {
    /// The caller-supplied loader failed and no fallback value exists.
    LoaderFailed(String),
    /// Remote (tier 2) cache unreachable; disk fallback (tier 3) also had
    /// nothing for this key.
    RemoteUnavailable(String),
    Disk(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::LoaderFailed(msg) => write!(f, "loader failed: {msg}"),
            CacheError::RemoteUnavailable(msg) => write!(f, "remote cache unavailable: {msg}"),
            CacheError::Disk(msg) => write!(f, "disk fallback error: {msg}"),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<CacheError> for SyncError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::LoaderFailed(message) => SyncError::Internal { message },
            CacheError::RemoteUnavailable(message) => SyncError::DependencyUnavailable {
                service: "cache".into(),
                message,
            },
            CacheError::Disk(message) => SyncError::Internal { message },
        }
    }
}
