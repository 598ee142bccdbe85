use crate::{RateLimiter, RateLimiterConfig, RateLimiterConfigBuilder};
use std::sync::Arc;
use tower::Layer;

/// A Tower [`Layer`] that applies one host's token bucket to a service.
///
/// `syncbridge-http` builds one of these per host it talks to (target,
/// fleet-management, directory service, ...), so a burst against one
/// dependency never starves a request against another.
///
/// # Examples
///
/// ```
/// use syncbridge_ratelimiter::RateLimiterLayer;
/// use tower::ServiceBuilder;
///
/// # async fn example() {
/// let rate_limiter = RateLimiterLayer::builder()
///     .rps(10.0)
///     .burst(20)
///     .host("target.example.com")
///     .build();
///
/// let service = ServiceBuilder::new()
///     .layer(rate_limiter)
///     .service(my_service());
/// # }
/// # fn my_service() -> impl tower::Service<String, Response = String, Error = std::io::Error> {
/// #     tower::service_fn(|req: String| async move { Ok::<_, std::io::Error>(req) })
/// # }
/// ```
#[derive(Clone)]
pub struct RateLimiterLayer {
    config: Arc<RateLimiterConfig>,
}

impl RateLimiterLayer {
    /// Creates a new `RateLimiterLayer` with the given configuration.
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Starts a [`RateLimiterConfigBuilder`] with the shared defaults.
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::new()
    }
}

impl<S> Layer<S> for RateLimiterLayer {
    type Service = RateLimiter<S>;

    fn layer(&self, service: S) -> Self::Service {
        RateLimiter::new(service, Arc::clone(&self.config))
    }
}
