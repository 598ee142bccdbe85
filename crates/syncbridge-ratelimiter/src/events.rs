use std::time::Instant;
use syncbridge_core::TrackerEvent;

/// Events emitted by a single host's token bucket.
#[derive(Debug, Clone)]
pub enum RateLimiterEvent {
    /// A token was acquired, possibly after waiting `wait_duration`.
    PermitAcquired {
        host: String,
        timestamp: Instant,
        wait_duration: std::time::Duration,
    },
    /// No token became available within `timeout_duration`.
    PermitRejected {
        host: String,
        timestamp: Instant,
        timeout_duration: std::time::Duration,
    },
}

impl TrackerEvent for RateLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RateLimiterEvent::PermitAcquired { .. } => "permit_acquired",
            RateLimiterEvent::PermitRejected { .. } => "permit_rejected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RateLimiterEvent::PermitAcquired { timestamp, .. }
            | RateLimiterEvent::PermitRejected { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            RateLimiterEvent::PermitAcquired { host, .. }
            | RateLimiterEvent::PermitRejected { host, .. } => host,
        }
    }
}
