use std::fmt;
use syncbridge_core::SyncError;

/// Error returned by [`crate::TimeLimiter`]: either the inner service
/// failed, or it failed to finish within the configured timeout.
#[derive(Debug, Clone)]
pub enum TimeLimiterError<E> {
    Inner(E),
    Timeout { host: String },
}

impl<E> TimeLimiterError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TimeLimiterError::Timeout { .. })
    }

    pub fn into_inner(self) -> Option<E> {
        match self {
            TimeLimiterError::Inner(e) => Some(e),
            TimeLimiterError::Timeout { .. } => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for TimeLimiterError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeLimiterError::Inner(e) => write!(f, "{e}"),
            TimeLimiterError::Timeout { host } => write!(f, "call to {host} timed out"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for TimeLimiterError<E> {}

impl From<TimeLimiterError<SyncError>> for SyncError {
    fn from(err: TimeLimiterError<SyncError>) -> Self {
        match err {
            TimeLimiterError::Inner(e) => e,
            TimeLimiterError::Timeout { host } => SyncError::Transport {
                host,
                message: "call timed out".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_converts_to_transport_error() {
        let err: TimeLimiterError<SyncError> = TimeLimiterError::Timeout {
            host: "erp.example.com".into(),
        };
        let sync_error: SyncError = err.into();
        assert!(matches!(sync_error, SyncError::Transport { .. }));
    }
}
