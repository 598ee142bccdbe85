use std::time::{Duration, Instant};
use syncbridge_core::TrackerEvent;

/// Events emitted by one host's concurrency-cap semaphore.
#[derive(Debug, Clone)]
pub enum BulkheadEvent {
    CallPermitted {
        host: String,
        timestamp: Instant,
        concurrent_calls: usize,
    },
    CallRejected {
        host: String,
        timestamp: Instant,
        max_concurrent_calls: usize,
    },
    CallFinished {
        host: String,
        timestamp: Instant,
        duration: Duration,
    },
    CallFailed {
        host: String,
        timestamp: Instant,
        duration: Duration,
    },
}

impl TrackerEvent for BulkheadEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BulkheadEvent::CallPermitted { .. } => "call_permitted",
            BulkheadEvent::CallRejected { .. } => "call_rejected",
            BulkheadEvent::CallFinished { .. } => "call_finished",
            BulkheadEvent::CallFailed { .. } => "call_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            BulkheadEvent::CallPermitted { timestamp, .. }
            | BulkheadEvent::CallRejected { timestamp, .. }
            | BulkheadEvent::CallFinished { timestamp, .. }
            | BulkheadEvent::CallFailed { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            BulkheadEvent::CallPermitted { host, .. }
            | BulkheadEvent::CallRejected { host, .. }
            | BulkheadEvent::CallFinished { host, .. }
            | BulkheadEvent::CallFailed { host, .. } => host,
        }
    }
}
