//! Tower layer for the per-host call timeout.

use crate::config::TimeLimiterConfig;
use crate::TimeLimiter;
use std::sync::Arc;
use tower::layer::Layer;

/// A Tower layer that applies a hard timeout to every call against one host.
#[derive(Clone)]
pub struct TimeLimiterLayer {
    config: Arc<TimeLimiterConfig>,
}

impl TimeLimiterLayer {
    pub(crate) fn new(config: impl Into<Arc<TimeLimiterConfig>>) -> Self {
        Self {
            config: config.into(),
        }
    }

    /// Starts a [`crate::TimeLimiterConfigBuilder`] with the shared defaults.
    ///
    /// ```rust
    /// use syncbridge_timelimiter::TimeLimiterLayer;
    /// use std::time::Duration;
    ///
    /// let layer = TimeLimiterLayer::builder()
    ///     .timeout_duration(Duration::from_secs(30))
    ///     .host("erp.example.com")
    ///     .build();
    /// ```
    pub fn builder() -> crate::TimeLimiterConfigBuilder {
        crate::TimeLimiterConfigBuilder::new()
    }
}

impl From<TimeLimiterConfig> for TimeLimiterLayer {
    fn from(config: TimeLimiterConfig) -> Self {
        Self::new(config)
    }
}

impl<S> Layer<S> for TimeLimiterLayer {
    type Service = TimeLimiter<S>;

    fn layer(&self, service: S) -> Self::Service {
        TimeLimiter::new(service, Arc::clone(&self.config))
    }
}
