//! Configuration for one host's call timeout.

use crate::events::TimeLimiterEvent;
use std::time::Duration;
use syncbridge_core::{EventListeners, FnListener};

/// Configuration for the time limiter pattern.
pub struct TimeLimiterConfig {
    pub(crate) timeout_duration: Duration,
    pub(crate) event_listeners: EventListeners<TimeLimiterEvent>,
    pub(crate) host: String,
}

/// Builder for [`TimeLimiterConfig`].
pub struct TimeLimiterConfigBuilder {
    timeout_duration: Duration,
    event_listeners: EventListeners<TimeLimiterEvent>,
    host: String,
}

impl TimeLimiterConfigBuilder {
    /// Default: 30 second timeout, matching a conservative per-call budget
    /// for a dependency that hasn't set its own `queue_timeout`.
    pub fn new() -> Self {
        Self {
            timeout_duration: Duration::from_secs(30),
            event_listeners: EventListeners::new(),
            host: String::from("<unnamed>"),
        }
    }

    pub fn timeout_duration(mut self, duration: Duration) -> Self {
        self.timeout_duration = duration;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let TimeLimiterEvent::Success { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let TimeLimiterEvent::Error { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    pub fn on_timeout<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, TimeLimiterEvent::Timeout { .. }) {
                f();
            }
        }));
        self
    }

    pub fn build(self) -> crate::TimeLimiterLayer {
        let config = TimeLimiterConfig {
            timeout_duration: self.timeout_duration,
            event_listeners: self.event_listeners,
            host: self.host,
        };

        crate::TimeLimiterLayer::new(config)
    }
}

impl Default for TimeLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
