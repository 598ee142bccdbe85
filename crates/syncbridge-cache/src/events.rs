//! Cache events, in the teacher's `*Event` + `EventListeners` idiom
//! (adapted from `tower-resilience-cache`'s `CacheEvent` and
//! `tower-resilience-core`'s listener system).

use std::time::Instant;
use syncbridge_core::TrackerEvent;

#[derive(Debug, Clone)]
pub enum CacheEvent {
    Hit { key: String, timestamp: Instant },
    Miss { key: String, timestamp: Instant },
    /// A stale value was served by `get_with_fallback` because the loader
    /// failed (spec §4.2).
    StaleServed { key: String, timestamp: Instant },
    LoaderFailed {
        key: String,
        timestamp: Instant,
        message: String,
    },
    Invalidated { key: String, timestamp: Instant },
    Refreshed { key: String, timestamp: Instant },
    RemoteUnavailable { key: String, timestamp: Instant },
}

impl CacheEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            CacheEvent::Hit { .. } => "hit",
            CacheEvent::Miss { .. } => "miss",
            CacheEvent::StaleServed { .. } => "stale_served",
            CacheEvent::LoaderFailed { .. } => "loader_failed",
            CacheEvent::Invalidated { .. } => "invalidated",
            CacheEvent::Refreshed { .. } => "refreshed",
            CacheEvent::RemoteUnavailable { .. } => "remote_unavailable",
        }
    }

    pub fn key(&self) -> &str {
        match self {
            CacheEvent::Hit { key, .. }
            | CacheEvent::Miss { key, .. }
            | CacheEvent::StaleServed { key, .. }
            | CacheEvent::LoaderFailed { key, .. }
            | CacheEvent::Invalidated { key, .. }
            | CacheEvent::Refreshed { key, .. }
            | CacheEvent::RemoteUnavailable { key, .. } => key,
        }
    }

    fn timestamp_inner(&self) -> Instant {
        match self {
            CacheEvent::Hit { timestamp, .. }
            | CacheEvent::Miss { timestamp, .. }
            | CacheEvent::StaleServed { timestamp, .. }
            | CacheEvent::LoaderFailed { timestamp, .. }
            | CacheEvent::Invalidated { timestamp, .. }
            | CacheEvent::Refreshed { timestamp, .. }
            | CacheEvent::RemoteUnavailable { timestamp, .. } => *timestamp,
        }
    }
}

impl TrackerEvent for CacheEvent {
    fn event_type(&self) -> &'static str {
        CacheEvent::event_type(self)
    }

    fn timestamp(&self) -> Instant {
        self.timestamp_inner()
    }

    fn source_name(&self) -> &str {
        self.key()
    }
}
