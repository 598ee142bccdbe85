//! Retry-with-backoff middleware for the syncbridge HTTP client.
//!
//! Retries `TransportError`, `TimeoutError`, HTTP 429, and 5xx other than
//! 501/505, waiting `base * 2^attempt` with full jitter capped at
//! `max_backoff`, honoring a `Retry-After` header when the inner error
//! carries one. Non-idempotent methods (`POST` without an idempotency key)
//! should be capped to a single attempt via [`RetryConfigBuilder::max_attempts_fn`]
//! by the caller, since only the caller knows whether a given failure
//! happened before or after the request reached the wire.
//!
//! # Examples
//!
//! ```
//! use syncbridge_retry::RetryLayer;
//! use tower::ServiceBuilder;
//! use std::time::Duration;
//!
//! # #[derive(Debug, Clone)]
//! # struct MyError;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let retry_layer = RetryLayer::<String, MyError>::builder()
//!     .max_attempts(5)
//!     .exponential_backoff(Duration::from_millis(100))
//!     .host("erp.example.com")
//!     .on_retry(|attempt, delay| {
//!         println!("Retry attempt {} after {:?}", attempt, delay);
//!     })
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(retry_layer)
//!     .service(tower::service_fn(|req: String| async move {
//!         Ok::<_, MyError>(format!("Response: {}", req))
//!     }));
//! # Ok(())
//! # }
//! ```
//!
//! ## Per-request max attempts
//!
//! ```
//! use syncbridge_retry::RetryLayer;
//! use std::time::Duration;
//!
//! #[derive(Clone)]
//! struct MyRequest {
//!     is_idempotent: bool,
//!     data: String,
//! }
//!
//! # #[derive(Debug, Clone)]
//! # struct MyError;
//! # async fn example() {
//! let retry_layer = RetryLayer::<MyRequest, MyError>::builder()
//!     .max_attempts_fn(|req: &MyRequest| if req.is_idempotent { 5 } else { 1 })
//!     .exponential_backoff(Duration::from_millis(100))
//!     .build();
//! # }
//! ```

mod backoff;
mod config;
mod events;
mod layer;
mod policy;

pub use backoff::{ExponentialBackoff, ExponentialRandomBackoff, FixedInterval, FnInterval, IntervalFunction};
pub use config::{MaxAttemptsSource, RetryConfig, RetryConfigBuilder};
pub use events::RetryEvent;
pub use layer::RetryLayer;
pub use policy::{RetryPolicy, RetryPredicate};

use futures::future::BoxFuture;
use std::marker::PhantomData;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::Service;

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_histogram, histogram};

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

/// A Tower [`Service`] that retries failed requests against one host.
pub struct Retry<S, Req, E> {
    inner: S,
    config: Arc<RetryConfig<Req, E>>,
    _phantom: PhantomData<Req>,
}

impl<S, Req, E> Retry<S, Req, E> {
    pub fn new(inner: S, config: Arc<RetryConfig<Req, E>>, _phantom: PhantomData<Req>) -> Self {
        #[cfg(feature = "metrics")]
        {
            describe_counter!(
                "retry_calls_total",
                "Total number of retry operations (success or exhausted)"
            );
            describe_counter!("retry_attempts_total", "Total number of retry attempts across all calls");
            describe_histogram!("retry_attempts", "Number of attempts per successful call");
        }

        Self {
            inner,
            config,
            _phantom,
        }
    }
}

impl<S, Req, E> Clone for Retry<S, Req, E>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
            _phantom: PhantomData,
        }
    }
}

impl<S, Req, E> Service<Req> for Retry<S, Req, E>
where
    S: Service<Req, Error = E> + Clone + Send + 'static,
    S::Future: Send + 'static,
    Req: Clone + Send + 'static,
    E: Clone + Send + 'static,
    S::Response: Send + 'static,
{
    type Response = S::Response;
    type Error = E;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let mut service = self.inner.clone();
        let config = Arc::clone(&self.config);
        let max_attempts = config.max_attempts_source.get_max_attempts(&req);

        Box::pin(async move {
            let mut attempt = 0;

            loop {
                let result = service.call(req.clone()).await;

                match result {
                    Ok(response) => {
                        #[cfg(feature = "metrics")]
                        {
                            counter!("retry_calls_total", "host" => config.host.clone(), "result" => "success")
                                .increment(1);
                            histogram!("retry_attempts", "host" => config.host.clone())
                                .record((attempt + 1) as f64);
                        }

                        #[cfg(feature = "tracing")]
                        {
                            if attempt > 0 {
                                info!(host = %config.host, attempts = attempt + 1, "request succeeded after retries");
                            } else {
                                debug!(host = %config.host, "request succeeded on first attempt");
                            }
                        }

                        let event = RetryEvent::Success {
                            host: config.host.clone(),
                            timestamp: Instant::now(),
                            attempts: attempt + 1,
                        };
                        config.event_listeners.emit(&event);
                        return Ok(response);
                    }
                    Err(error) => {
                        if !config.policy.should_retry(&error) {
                            #[cfg(feature = "tracing")]
                            debug!(host = %config.host, "error not retryable, failing immediately");

                            let event = RetryEvent::IgnoredError {
                                host: config.host.clone(),
                                timestamp: Instant::now(),
                            };
                            config.event_listeners.emit(&event);
                            return Err(error);
                        }

                        if attempt + 1 >= max_attempts {
                            #[cfg(feature = "metrics")]
                            counter!("retry_calls_total", "host" => config.host.clone(), "result" => "exhausted")
                                .increment(1);

                            #[cfg(feature = "tracing")]
                            warn!(host = %config.host, attempts = attempt + 1, max_attempts, "retry attempts exhausted");

                            let event = RetryEvent::Error {
                                host: config.host.clone(),
                                timestamp: Instant::now(),
                                attempts: attempt + 1,
                            };
                            config.event_listeners.emit(&event);
                            return Err(error);
                        }

                        let delay = config.policy.next_backoff(attempt, &error);

                        #[cfg(feature = "metrics")]
                        counter!("retry_attempts_total", "host" => config.host.clone()).increment(1);

                        #[cfg(feature = "tracing")]
                        debug!(host = %config.host, attempt = attempt + 1, delay_ms = delay.as_millis(), "retrying after delay");

                        let event = RetryEvent::Retry {
                            host: config.host.clone(),
                            timestamp: Instant::now(),
                            attempt,
                            delay,
                        };
                        config.event_listeners.emit(&event);

                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
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
    use tower::service_fn;
    use tower::{Layer, ServiceExt};

    #[derive(Debug, Clone)]
    struct TestError {
        #[allow(dead_code)]
        message: String,
    }

    impl TestError {
        fn new(message: &str) -> Self {
            Self {
                message: message.to_string(),
            }
        }
    }

    #[tokio::test]
    async fn successful_request_no_retry() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let cc = Arc::clone(&call_count);

        let service = service_fn(move |req: String| {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TestError>(format!("Response: {}", req))
            }
        });

        let layer = RetryLayer::<String, TestError>::builder()
            .max_attempts(3)
            .fixed_backoff(Duration::from_millis(10))
            .build();

        let mut service = layer.layer(service);

        let response = service.ready().await.unwrap().call("test".to_string()).await.unwrap();

        assert_eq!(response, "Response: test");
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_on_failure() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let cc = Arc::clone(&call_count);

        let service = service_fn(move |_req: String| {
            let cc = Arc::clone(&cc);
            async move {
                let count = cc.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(TestError::new("temporary failure"))
                } else {
                    Ok::<_, TestError>("success".to_string())
                }
            }
        });

        let layer = RetryLayer::<String, TestError>::builder()
            .max_attempts(3)
            .fixed_backoff(Duration::from_millis(10))
            .build();

        let mut service = layer.layer(service);

        let response = service.ready().await.unwrap().call("test".to_string()).await.unwrap();

        assert_eq!(response, "success");
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_retries() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let cc = Arc::clone(&call_count);

        let service = service_fn(move |_req: String| {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(TestError::new("permanent failure"))
            }
        });

        let layer = RetryLayer::<String, TestError>::builder()
            .max_attempts(3)
            .fixed_backoff(Duration::from_millis(10))
            .build();

        let mut service = layer.layer(service);

        let result = service.ready().await.unwrap().call("test".to_string()).await;

        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_predicate_filters_errors() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let cc = Arc::clone(&call_count);

        let service = service_fn(move |_req: String| {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(TestError::new("non-retryable"))
            }
        });

        let layer = RetryLayer::<String, TestError>::builder()
            .max_attempts(3)
            .fixed_backoff(Duration::from_millis(10))
            .retry_on(|_: &TestError| false)
            .build();

        let mut service = layer.layer(service);

        let result = service.ready().await.unwrap().call("test".to_string()).await;

        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_after_hint_overrides_backoff() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let cc = Arc::clone(&call_count);

        let service = service_fn(move |_req: String| {
            let cc = Arc::clone(&cc);
            async move {
                let count = cc.fetch_add(1, Ordering::SeqCst);
                if count == 0 {
                    Err(TestError::new("rate_limited"))
                } else {
                    Ok::<_, TestError>("ok".to_string())
                }
            }
        });

        let layer = RetryLayer::<String, TestError>::builder()
            .max_attempts(3)
            .exponential_backoff(Duration::from_secs(30))
            .retry_after(|err: &TestError| {
                if err.message == "rate_limited" {
                    Some(Duration::from_millis(5))
                } else {
                    None
                }
            })
            .build();

        let mut service = layer.layer(service);
        let start = Instant::now();
        let result = service.ready().await.unwrap().call("test".to_string()).await;
        assert!(result.is_ok());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn event_listeners_called() {
        let retry_count = Arc::new(AtomicUsize::new(0));
        let success_count = Arc::new(AtomicUsize::new(0));

        let rc = Arc::clone(&retry_count);
        let sc = Arc::clone(&success_count);

        let call_count = Arc::new(AtomicUsize::new(0));
        let cc = Arc::clone(&call_count);

        let service = service_fn(move |_req: String| {
            let cc = Arc::clone(&cc);
            async move {
                let count = cc.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(TestError::new("temporary"))
                } else {
                    Ok::<_, TestError>("success".to_string())
                }
            }
        });

        let layer = RetryLayer::<String, TestError>::builder()
            .max_attempts(3)
            .fixed_backoff(Duration::from_millis(10))
            .on_retry(move |_, _| {
                rc.fetch_add(1, Ordering::SeqCst);
            })
            .on_success(move |_| {
                sc.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        let mut service = layer.layer(service);

        let _ = service.ready().await.unwrap().call("test".to_string()).await;

        assert_eq!(retry_count.load(Ordering::SeqCst), 2);
        assert_eq!(success_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn per_request_max_attempts() {
        #[derive(Clone)]
        struct Request {
            is_idempotent: bool,
        }

        let call_count = Arc::new(AtomicUsize::new(0));
        let cc = Arc::clone(&call_count);

        let service = service_fn(move |_req: Request| {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(TestError::new("always fails"))
            }
        });

        let layer = RetryLayer::<Request, TestError>::builder()
            .max_attempts_fn(|req: &Request| if req.is_idempotent { 5 } else { 1 })
            .fixed_backoff(Duration::from_millis(1))
            .build();

        let mut service = layer.layer(service);

        call_count.store(0, Ordering::SeqCst);
        let _ = service
            .ready()
            .await
            .unwrap()
            .call(Request { is_idempotent: false })
            .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        call_count.store(0, Ordering::SeqCst);
        let _ = service
            .ready()
            .await
            .unwrap()
            .call(Request { is_idempotent: true })
            .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 5);
    }
}
