//! Error types for the concurrency-cap bulkhead.

use syncbridge_core::SyncError;

/// Errors that can occur when acquiring a concurrency permit for a host.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BulkheadError {
    /// The bulkhead rejected the call because the host is at capacity.
    #[error("bulkhead for {host} is full: max concurrent calls ({max_concurrent_calls}) reached")]
    BulkheadFull {
        host: String,
        max_concurrent_calls: usize,
    },
    /// Timed out waiting for a permit.
    #[error("timeout waiting for a bulkhead permit for {host}")]
    Timeout { host: String },
}

impl From<BulkheadError> for SyncError {
    fn from(err: BulkheadError) -> Self {
        match err {
            BulkheadError::BulkheadFull { host, .. } | BulkheadError::Timeout { host } => {
                SyncError::DependencyUnavailable {
                    service: host,
                    message: "concurrency cap exceeded".to_string(),
                }
            }
        }
    }
}

/// Result type for bulkhead operations.
pub type Result<T> = std::result::Result<T, BulkheadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulkhead_full_converts_to_dependency_unavailable() {
        let err = BulkheadError::BulkheadFull {
            host: "erp.example.com".into(),
            max_concurrent_calls: 8,
        };
        let sync_error: SyncError = err.into();
        assert!(matches!(
            sync_error,
            SyncError::DependencyUnavailable { .. }
        ));
    }
}
