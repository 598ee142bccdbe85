use crate::events::RateLimiterEvent;
use std::time::Duration;
use syncbridge_core::{EventListeners, FnListener};

/// Configuration for one host's token bucket.
pub struct RateLimiterConfig {
    pub(crate) rps: f64,
    pub(crate) burst: u32,
    pub(crate) queue_timeout: Duration,
    pub(crate) event_listeners: EventListeners<RateLimiterEvent>,
    pub(crate) host: String,
}

/// Builder for [`RateLimiterConfig`].
pub struct RateLimiterConfigBuilder {
    rps: f64,
    burst: u32,
    queue_timeout: Duration,
    event_listeners: EventListeners<RateLimiterEvent>,
    host: String,
}

impl Default for RateLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterConfigBuilder {
    /// Creates a new builder with defaults matching [`syncbridge_core::Settings`]'s
    /// `http_rps_per_host` / `http_burst_per_host` / `queue_timeout` fields.
    ///
    /// Defaults:
    /// - rps: 10.0
    /// - burst: 20
    /// - queue_timeout: 5 seconds
    /// - host: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            rps: 10.0,
            burst: 20,
            queue_timeout: Duration::from_secs(5),
            event_listeners: EventListeners::new(),
            host: "<unnamed>".to_string(),
        }
    }

    /// Sets the steady-state number of tokens refilled per second.
    pub fn rps(mut self, rps: f64) -> Self {
        self.rps = rps;
        self
    }

    /// Sets the bucket capacity, i.e. how many requests can burst through
    /// immediately after an idle period.
    pub fn burst(mut self, burst: u32) -> Self {
        self.burst = burst;
        self
    }

    /// Sets how long a caller will wait for a token before being rejected
    /// with [`crate::RateLimiterError::RateLimitExceeded`].
    pub fn queue_timeout(mut self, duration: Duration) -> Self {
        self.queue_timeout = duration;
        self
    }

    /// Sets the host name this limiter guards (used in events and errors).
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self
    }

    /// Registers a callback invoked when a token is acquired, with the
    /// duration the caller had to wait (close to zero when the bucket is
    /// not under pressure).
    pub fn on_permit_acquired<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RateLimiterEvent::PermitAcquired { wait_duration, .. } = event {
                f(*wait_duration);
            }
        }));
        self
    }

    /// Registers a callback invoked when a caller is rejected after waiting
    /// the full `queue_timeout` without acquiring a token.
    pub fn on_permit_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RateLimiterEvent::PermitRejected {
                timeout_duration, ..
            } = event
            {
                f(*timeout_duration);
            }
        }));
        self
    }

    /// Builds the rate limiter layer.
    pub fn build(self) -> crate::RateLimiterLayer {
        let config = RateLimiterConfig {
            rps: self.rps,
            burst: self.burst,
            queue_timeout: self.queue_timeout,
            event_listeners: self.event_listeners,
            host: self.host,
        };

        crate::RateLimiterLayer::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RateLimiterLayer;

    #[test]
    fn test_builder_defaults() {
        let _layer = RateLimiterLayer::builder().build();
    }

    #[test]
    fn test_builder_custom_values() {
        let _layer = RateLimiterLayer::builder()
            .rps(100.0)
            .burst(50)
            .queue_timeout(Duration::from_millis(500))
            .host("api.example.com")
            .build();
    }

    #[test]
    fn test_event_listeners() {
        let _layer = RateLimiterLayer::builder()
            .on_permit_acquired(|_| {})
            .on_permit_rejected(|_| {})
            .build();
    }
}
