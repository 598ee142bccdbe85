use std::time::{Duration, Instant};
use syncbridge_core::TrackerEvent;

/// Events emitted by the retry middleware.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// A retry attempt is about to be made.
    Retry {
        host: String,
        timestamp: Instant,
        attempt: usize,
        delay: Duration,
    },
    /// The operation succeeded (either on first try or after retries).
    Success {
        host: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// The operation failed after exhausting all retry attempts.
    Error {
        host: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// An error occurred but was not retried (filtered by the retry predicate).
    IgnoredError { host: String, timestamp: Instant },
}

impl TrackerEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "retry",
            RetryEvent::Success { .. } => "success",
            RetryEvent::Error { .. } => "error",
            RetryEvent::IgnoredError { .. } => "ignored_error",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Error { timestamp, .. }
            | RetryEvent::IgnoredError { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            RetryEvent::Retry { host, .. }
            | RetryEvent::Success { host, .. }
            | RetryEvent::Error { host, .. }
            | RetryEvent::IgnoredError { host, .. } => host,
        }
    }
}
