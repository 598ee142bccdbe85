use std::time::{Duration, Instant};
use syncbridge_core::TrackerEvent;

/// Events emitted by one host's call timeout.
#[derive(Debug, Clone)]
pub enum TimeLimiterEvent {
    Success {
        host: String,
        timestamp: Instant,
        duration: Duration,
    },
    Error {
        host: String,
        timestamp: Instant,
        duration: Duration,
    },
    Timeout {
        host: String,
        timestamp: Instant,
        timeout_duration: Duration,
    },
}

impl TrackerEvent for TimeLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TimeLimiterEvent::Success { .. } => "success",
            TimeLimiterEvent::Error { .. } => "error",
            TimeLimiterEvent::Timeout { .. } => "timeout",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            TimeLimiterEvent::Success { timestamp, .. }
            | TimeLimiterEvent::Error { timestamp, .. }
            | TimeLimiterEvent::Timeout { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            TimeLimiterEvent::Success { host, .. }
            | TimeLimiterEvent::Error { host, .. }
            | TimeLimiterEvent::Timeout { host, .. } => host,
        }
    }
}
