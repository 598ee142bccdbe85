//! Per-host token bucket rate limiting, as a Tower middleware.
//!
//! Each instance guards exactly one host. `syncbridge-http` keeps a small
//! map of these, keyed by host, so the target, fleet-management, and
//! directory dependencies are throttled independently.
//!
//! # Examples
//!
//! ```
//! use syncbridge_ratelimiter::RateLimiterLayer;
//! use tower::ServiceBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // 10 requests/sec steady state, bursts of up to 20, fail fast after 500ms.
//! let rate_limiter = RateLimiterLayer::builder()
//!     .rps(10.0)
//!     .burst(20)
//!     .queue_timeout(Duration::from_millis(500))
//!     .host("target.example.com")
//!     .on_permit_acquired(|wait_duration| {
//!         println!("token acquired after {:?}", wait_duration);
//!     })
//!     .on_permit_rejected(|timeout| {
//!         println!("rate limited! timeout: {:?}", timeout);
//!     })
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(rate_limiter)
//!     .service(tower::service_fn(|req: String| async move {
//!         Ok::<_, syncbridge_core::SyncError>(format!("response: {}", req))
//!     }));
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod events;
mod layer;
mod limiter;

pub use config::{RateLimiterConfig, RateLimiterConfigBuilder};
pub use error::RateLimiterError;
pub use events::RateLimiterEvent;
pub use layer::RateLimiterLayer;

use crate::limiter::SharedTokenBucket;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::Service;

/// A Tower [`Service`] that applies one host's token bucket.
pub struct RateLimiter<S> {
    inner: S,
    config: Arc<RateLimiterConfig>,
    bucket: SharedTokenBucket,
}

impl<S> RateLimiter<S> {
    /// Creates a new `RateLimiter` wrapping the given service.
    pub fn new(inner: S, config: Arc<RateLimiterConfig>) -> Self {
        let bucket = SharedTokenBucket::new(config.rps, config.burst, config.queue_timeout);

        Self {
            inner,
            config,
            bucket,
        }
    }

    /// Tokens currently available without waiting, for `/cache/stats`-style
    /// diagnostics endpoints.
    pub fn available_tokens(&self) -> f64 {
        self.bucket.available_tokens()
    }
}

impl<S> Clone for RateLimiter<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
            bucket: self.bucket.clone(),
        }
    }
}

impl<S, Req> Service<Req> for RateLimiter<S>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Error: From<RateLimiterError> + Send + 'static,
    S::Future: Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let bucket = self.bucket.clone();
        let config = Arc::clone(&self.config);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match bucket.acquire().await {
                Ok(wait_duration) => {
                    let event = RateLimiterEvent::PermitAcquired {
                        host: config.host.clone(),
                        timestamp: Instant::now(),
                        wait_duration,
                    };
                    config.event_listeners.emit(&event);

                    // The bucket has already released a token; whatever the
                    // wrapped service does with the request from here is its
                    // own business, not the rate limiter's.
                    inner.call(req).await
                }
                Err(()) => {
                    let event = RateLimiterEvent::PermitRejected {
                        host: config.host.clone(),
                        timestamp: Instant::now(),
                        timeout_duration: config.queue_timeout,
                    };
                    config.event_listeners.emit(&event);

                    Err(RateLimiterError::RateLimitExceeded {
                        host: config.host.clone(),
                        retry_after: config.queue_timeout,
                    }
                    .into())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use syncbridge_core::SyncError;
    use tower::service_fn;
    use tower::{Layer, ServiceExt};

    #[tokio::test]
    async fn allows_requests_within_burst() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let cc = Arc::clone(&call_count);

        let service = service_fn(move |req: String| {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<_, SyncError>(format!("response: {req}"))
            }
        });

        let layer = RateLimiterLayer::builder()
            .rps(10.0)
            .burst(10)
            .queue_timeout(Duration::from_millis(100))
            .build();

        let mut service = layer.layer(service);

        for _ in 0..10 {
            let result = service
                .ready()
                .await
                .unwrap()
                .call("test".to_string())
                .await;
            assert!(result.is_ok());
        }

        assert_eq!(call_count.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn rejects_requests_over_burst_within_timeout() {
        let service = service_fn(|req: String| async move {
            Ok::<_, SyncError>(format!("response: {req}"))
        });

        let layer = RateLimiterLayer::builder()
            .rps(0.1)
            .burst(2)
            .queue_timeout(Duration::from_millis(10))
            .build();

        let mut service = layer.layer(service);

        assert!(service.ready().await.unwrap().call("1".to_string()).await.is_ok());
        assert!(service.ready().await.unwrap().call("2".to_string()).await.is_ok());

        let result = service.ready().await.unwrap().call("3".to_string()).await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), SyncError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn waits_for_a_refill_within_queue_timeout() {
        let service =
            service_fn(|_req: String| async move { Ok::<_, SyncError>("ok".to_string()) });

        let layer = RateLimiterLayer::builder()
            .rps(100.0)
            .burst(1)
            .queue_timeout(Duration::from_millis(100))
            .build();

        let mut service = layer.layer(service);

        assert!(service.ready().await.unwrap().call("1".to_string()).await.is_ok());

        let start = std::time::Instant::now();
        let result = service.ready().await.unwrap().call("2".to_string()).await;
        let elapsed = start.elapsed();

        assert!(result.is_ok());
        assert!(elapsed < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn event_listeners_are_called() {
        let acquired_count = Arc::new(AtomicUsize::new(0));
        let rejected_count = Arc::new(AtomicUsize::new(0));

        let ac = Arc::clone(&acquired_count);
        let rc = Arc::clone(&rejected_count);

        let service =
            service_fn(|_req: String| async move { Ok::<_, SyncError>("ok".to_string()) });

        let layer = RateLimiterLayer::builder()
            .rps(0.1)
            .burst(1)
            .queue_timeout(Duration::from_millis(10))
            .on_permit_acquired(move |_| {
                ac.fetch_add(1, Ordering::SeqCst);
            })
            .on_permit_rejected(move |_| {
                rc.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        let mut service = layer.layer(service);

        let _ = service.ready().await.unwrap().call("1".to_string()).await;
        assert_eq!(acquired_count.load(Ordering::SeqCst), 1);

        let _ = service.ready().await.unwrap().call("2".to_string()).await;
        assert_eq!(rejected_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn inner_failure_after_a_granted_permit_is_not_reported_as_rate_limited() {
        let service = service_fn(|_req: String| async move {
            Err::<String, _>(SyncError::Transport {
                host: "target.example.com".into(),
                message: "connection reset".into(),
            })
        });

        let layer = RateLimiterLayer::builder()
            .rps(10.0)
            .burst(10)
            .queue_timeout(Duration::from_millis(100))
            .build();

        let mut service = layer.layer(service);

        let result = service.ready().await.unwrap().call("1".to_string()).await;
        assert!(matches!(result.unwrap_err(), SyncError::Transport { .. }));
    }
}
