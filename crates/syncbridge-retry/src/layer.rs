use crate::{Retry, RetryConfig};
use std::marker::PhantomData;
use std::sync::Arc;
use tower::Layer;

/// A Tower [`Layer`] that retries failed requests against one host according
/// to the configured backoff/jitter/Retry-After policy.
///
/// # Examples
///
/// ```
/// use syncbridge_retry::RetryLayer;
/// use tower::ServiceBuilder;
/// use std::time::Duration;
///
/// # #[derive(Debug, Clone)]
/// # struct MyError;
/// # async fn example() {
/// let retry_layer = RetryLayer::<String, MyError>::builder()
///     .max_attempts(5)
///     .exponential_backoff(Duration::from_millis(100))
///     .host("erp.example.com")
///     .build();
///
/// let service = ServiceBuilder::new()
///     .layer(retry_layer)
///     .service(my_service());
/// # }
/// # fn my_service() -> impl tower::Service<String, Response = String, Error = MyError> {
/// #     tower::service_fn(|req: String| async move { Ok::<_, MyError>(req) })
/// # }
/// ```
#[derive(Clone)]
pub struct RetryLayer<Req, E> {
    config: Arc<RetryConfig<Req, E>>,
}

impl<Req, E> RetryLayer<Req, E> {
    pub fn new(config: RetryConfig<Req, E>) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn builder() -> crate::RetryConfigBuilder<Req, E> {
        crate::RetryConfigBuilder::new()
    }

    // =========================================================================
    // Presets
    // =========================================================================

    /// Standard exponential backoff: 3 attempts, 100ms base, full jitter.
    pub fn exponential_backoff() -> crate::RetryConfigBuilder<Req, E> {
        use std::time::Duration;
        Self::builder()
            .max_attempts(3)
            .exponential_backoff(Duration::from_millis(100))
    }

    /// 5 attempts, 50ms base — for latency-sensitive calls against a host
    /// known to tolerate the extra load.
    pub fn aggressive() -> crate::RetryConfigBuilder<Req, E> {
        use std::time::Duration;
        Self::builder()
            .max_attempts(5)
            .exponential_backoff(Duration::from_millis(50))
    }

    /// 2 attempts, 500ms base — for a host already close to its rate limit.
    pub fn conservative() -> crate::RetryConfigBuilder<Req, E> {
        use std::time::Duration;
        Self::builder()
            .max_attempts(2)
            .exponential_backoff(Duration::from_millis(500))
    }
}

impl<S, Req, E> Layer<S> for RetryLayer<Req, E>
where
    E: Clone,
    Req: 'static,
{
    type Service = Retry<S, Req, E>;

    fn layer(&self, service: S) -> Self::Service {
        Retry::new(service, Arc::clone(&self.config), PhantomData)
    }
}
