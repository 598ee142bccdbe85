//! The closed error taxonomy shared by every syncbridge crate.
//!
//! Every adapter, cache, and engine error eventually becomes a [`SyncError`].
//! The variant names are the stable `code` strings surfaced in the
//! control-plane's error envelope and in the `errors_total{error_type}`
//! metric label, so they are part of the wire contract — don't rename a
//! variant without checking `syncbridge-control`'s error envelope mapping.

use std::fmt;
use std::time::Duration;

/// Stable error taxonomy. Adapters translate wire errors into these codes;
/// syncers recover from `validation_failed`, `conflict`, and `data_missing`
/// locally, while `auth_failed` and `internal` (from adapter initialization)
/// abort the current syncer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    /// Network/TLS/timeout failure at the adapter layer. Retried by the
    /// rate-limited HTTP client before ever reaching a syncer.
    #[error("transport error talking to {host}: {message}")]
    Transport { host: String, message: String },

    /// Remote 429 or local token-bucket exhaustion.
    #[error("rate limited by {host}, retry after {retry_after:?}")]
    RateLimited {
        host: String,
        retry_after: Option<Duration>,
    },

    /// Downstream 5xx persisted past the retry budget.
    #[error("{service} is unavailable: {message}")]
    DependencyUnavailable { service: String, message: String },

    /// Field-level validation failure produced by the validator. Never
    /// retried automatically; routed to the failed-record queue.
    #[error("validation failed for {entity_type}/{entity_id}: {message}")]
    ValidationFailed {
        entity_type: String,
        entity_id: String,
        message: String,
    },

    /// 409 from the target, or a sync trigger while one is already running.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// 401/403 from a dependency. Aborts the current syncer and flips
    /// readiness to false until the process restarts.
    #[error("authentication failed against {service}")]
    AuthFailed { service: String },

    /// A referential lookup (e.g. a site mapping) came back empty.
    /// Recorded as `skipped` with this as the reason, not as an error.
    #[error("referential data missing: {message}")]
    DataMissing { message: String },

    /// Unexpected failure; logged with a correlation id.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl SyncError {
    /// The stable `code` string used in the HTTP error envelope and in
    /// metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::Transport { .. } => "transport",
            SyncError::RateLimited { .. } => "rate_limited",
            SyncError::DependencyUnavailable { .. } => "dependency_unavailable",
            SyncError::ValidationFailed { .. } => "validation_failed",
            SyncError::Conflict { .. } => "conflict",
            SyncError::AuthFailed { .. } => "auth_failed",
            SyncError::DataMissing { .. } => "data_missing",
            SyncError::Internal { .. } => "internal",
        }
    }

    /// Whether this error should abort the current syncer rather than be
    /// recorded and skipped (§4.7: "a syncer aborts only on adapter-level
    /// authentication failure or on explicit cancellation").
    pub fn aborts_syncer(&self) -> bool {
        matches!(self, SyncError::AuthFailed { .. })
    }

    /// Whether this error is retried by the HTTP client rather than ever
    /// reaching a syncer.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::Transport { .. } | SyncError::RateLimited { .. }
        )
    }
}

/// The stable HTTP error envelope from §6: `{code, message, details?}`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorEnvelope {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&SyncError> for ErrorEnvelope {
    fn from(err: &SyncError) -> Self {
        ErrorEnvelope {
            code: err.code(),
            message: err.to_string(),
            details: None,
        }
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_strings() {
        let err = SyncError::AuthFailed {
            service: "fleet".into(),
        };
        assert_eq!(err.code(), "auth_failed");
        assert!(err.aborts_syncer());
    }

    #[test]
    fn transient_errors_never_abort() {
        let err = SyncError::Transport {
            host: "erp.example.com".into(),
            message: "connection reset".into(),
        };
        assert!(err.is_transient());
        assert!(!err.aborts_syncer());
    }

    #[test]
    fn envelope_carries_stable_code() {
        let err = SyncError::Conflict {
            message: "duplicate email".into(),
        };
        let envelope: ErrorEnvelope = (&err).into();
        assert_eq!(envelope.code, "conflict");
        assert!(envelope.message.contains("duplicate email"));
    }
}
