use std::fmt;
use std::time::Duration;
use syncbridge_core::SyncError;

/// Errors that can occur when acquiring a token from a host's bucket.
#[derive(Debug, Clone)]
pub enum RateLimiterError {
    /// No token became available within `queue_timeout`.
    RateLimitExceeded {
        host: String,
        retry_after: Duration,
    },
}

impl fmt::Display for RateLimiterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimiterError::RateLimitExceeded { host, retry_after } => write!(
                f,
                "rate limit exceeded for {host}, retry after {retry_after:?}"
            ),
        }
    }
}

impl std::error::Error for RateLimiterError {}

impl From<RateLimiterError> for SyncError {
    fn from(err: RateLimiterError) -> Self {
        match err {
            RateLimiterError::RateLimitExceeded { host, retry_after } => SyncError::RateLimited {
                host,
                retry_after: Some(retry_after),
            },
        }
    }
}
