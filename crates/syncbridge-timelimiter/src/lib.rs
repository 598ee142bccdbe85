//! Per-host hard call timeout for the syncbridge HTTP client.
//!
//! Wraps one host's transport in `tokio::time::timeout`, separate from
//! `queue_timeout` (which bounds waiting for a rate-limiter token or a
//! bulkhead permit before the call even starts). A host that accepts the
//! call but never responds is what this guards against.
//!
//! ## Basic example
//!
//! ```rust
//! use syncbridge_timelimiter::TimeLimiterConfig;
//! use tower::{Layer, service_fn};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let layer = TimeLimiterLayer::builder()
//!     .timeout_duration(Duration::from_secs(5))
//!     .host("erp.example.com")
//!     .on_timeout(|| {
//!         eprintln!("request timed out!");
//!     })
//!     .build();
//!
//! let svc = service_fn(|req: String| async move { Ok::<String, ()>(req) });
//! let mut service = layer.layer(svc);
//! # let _ = service;
//! # }
//! ```

use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::time::timeout;
use tower::Service;

pub use config::{TimeLimiterConfig, TimeLimiterConfigBuilder};
pub use error::TimeLimiterError;
pub use events::TimeLimiterEvent;
pub use layer::TimeLimiterLayer;

mod config;
mod error;
mod events;
mod layer;

/// A Tower service that applies one host's hard timeout to an inner service.
#[derive(Clone)]
pub struct TimeLimiter<S> {
    inner: S,
    config: Arc<TimeLimiterConfig>,
}

impl<S> TimeLimiter<S> {
    pub(crate) fn new(inner: S, config: Arc<TimeLimiterConfig>) -> Self {
        Self { inner, config }
    }
}

impl<S, Request> Service<Request> for TimeLimiter<S>
where
    S: Service<Request> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    Request: Send + 'static,
{
    type Response = S::Response;
    type Error = TimeLimiterError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(TimeLimiterError::Inner)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let mut inner = self.inner.clone();
        let config = Arc::clone(&self.config);
        let timeout_duration = config.timeout_duration;

        Box::pin(async move {
            let start = Instant::now();

            match timeout(timeout_duration, inner.call(req)).await {
                Ok(Ok(response)) => {
                    let duration = start.elapsed();
                    config.event_listeners.emit(&TimeLimiterEvent::Success {
                        host: config.host.clone(),
                        timestamp: Instant::now(),
                        duration,
                    });
                    Ok(response)
                }
                Ok(Err(err)) => {
                    let duration = start.elapsed();
                    config.event_listeners.emit(&TimeLimiterEvent::Error {
                        host: config.host.clone(),
                        timestamp: Instant::now(),
                        duration,
                    });
                    Err(TimeLimiterError::Inner(err))
                }
                Err(_elapsed) => {
                    config.event_listeners.emit(&TimeLimiterEvent::Timeout {
                        host: config.host.clone(),
                        timestamp: Instant::now(),
                        timeout_duration,
                    });
                    Err(TimeLimiterError::Timeout {
                        host: config.host.clone(),
                    })
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;
    use tower::{service_fn, Layer, ServiceExt};

    #[tokio::test]
    async fn test_success_within_timeout() {
        let layer = TimeLimiterLayer::builder()
            .timeout_duration(Duration::from_millis(100))
            .build();

        let svc = service_fn(|_req: ()| async {
            sleep(Duration::from_millis(10)).await;
            Ok::<_, ()>("success")
        });

        let mut service = layer.layer(svc);
        let result = service.ready().await.unwrap().call(()).await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "success");
    }

    #[tokio::test]
    async fn test_timeout_occurs() {
        let layer = TimeLimiterLayer::builder()
            .timeout_duration(Duration::from_millis(10))
            .build();

        let svc = service_fn(|_req: ()| async {
            sleep(Duration::from_millis(100)).await;
            Ok::<_, ()>("success")
        });

        let mut service = layer.layer(svc);
        let result = service.ready().await.unwrap().call(()).await;

        assert!(result.is_err());
        assert!(result.unwrap_err().is_timeout());
    }

    #[tokio::test]
    async fn test_inner_error_propagates() {
        let layer = TimeLimiterLayer::builder()
            .timeout_duration(Duration::from_millis(100))
            .build();

        let svc = service_fn(|_req: ()| async { Err::<(), _>("inner error") });

        let mut service = layer.layer(svc);
        let result = service.ready().await.unwrap().call(()).await;

        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(!err.is_timeout());
        assert_eq!(err.into_inner(), Some("inner error"));
    }

    #[tokio::test]
    async fn test_event_listeners() {
        let success_count = Arc::new(AtomicUsize::new(0));
        let timeout_count = Arc::new(AtomicUsize::new(0));

        let sc = Arc::clone(&success_count);
        let tc = Arc::clone(&timeout_count);

        let layer = TimeLimiterLayer::builder()
            .timeout_duration(Duration::from_millis(50))
            .on_success(move |_| {
                sc.fetch_add(1, Ordering::SeqCst);
            })
            .on_timeout(move || {
                tc.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        let svc = service_fn(|_req: ()| async {
            sleep(Duration::from_millis(10)).await;
            Ok::<_, ()>("ok")
        });
        let mut service = layer.layer(svc);
        let _ = service.ready().await.unwrap().call(()).await;
        assert_eq!(success_count.load(Ordering::SeqCst), 1);

        let svc = service_fn(|_req: ()| async {
            sleep(Duration::from_millis(100)).await;
            Ok::<_, ()>("ok")
        });
        let mut service = layer.layer(svc);
        let _ = service.ready().await.unwrap().call(()).await;
        assert_eq!(timeout_count.load(Ordering::SeqCst), 1);
    }
}
