use crate::backoff::{ExponentialBackoff, FixedInterval, IntervalFunction};
use crate::events::RetryEvent;
use crate::policy::{RetryAfterFn, RetryPolicy, RetryPredicate};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use syncbridge_core::{EventListeners, FnListener};

/// Source for determining the maximum number of retry attempts.
///
/// Most hosts use a fixed `max_attempts` from `Settings`; the dynamic form
/// exists for the non-idempotent-method rule in the HTTP client, which
/// needs to cap a given request to a single attempt based on a property of
/// the request itself (its HTTP method and whether it carries an
/// idempotency key) rather than a property of the host.
#[derive(Clone)]
pub enum MaxAttemptsSource<Req> {
    /// Fixed max attempts for every request sent through this client.
    Fixed(usize),
    /// Max attempts extracted per request.
    Dynamic(Arc<dyn Fn(&Req) -> usize + Send + Sync>),
}

impl<Req> MaxAttemptsSource<Req> {
    pub fn get_max_attempts(&self, req: &Req) -> usize {
        match self {
            MaxAttemptsSource::Fixed(n) => *n,
            MaxAttemptsSource::Dynamic(f) => f(req),
        }
    }
}

impl<Req> Default for MaxAttemptsSource<Req> {
    fn default() -> Self {
        MaxAttemptsSource::Fixed(3)
    }
}

/// Configuration for the retry middleware guarding one host.
pub struct RetryConfig<Req, E> {
    pub(crate) policy: RetryPolicy<E>,
    pub(crate) max_attempts_source: MaxAttemptsSource<Req>,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
    pub(crate) host: String,
}

/// Builder for [`RetryConfig`].
pub struct RetryConfigBuilder<Req, E> {
    max_attempts_source: MaxAttemptsSource<Req>,
    interval_fn: Option<Arc<dyn IntervalFunction>>,
    retry_predicate: Option<RetryPredicate<E>>,
    retry_after_fn: Option<RetryAfterFn<E>>,
    event_listeners: EventListeners<RetryEvent>,
    host: String,
    _phantom: PhantomData<Req>,
}

impl<Req, E> Default for RetryConfigBuilder<Req, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req, E> RetryConfigBuilder<Req, E> {
    /// Defaults: max_attempts=3, exponential backoff with a 100ms base and
    /// full jitter.
    pub fn new() -> Self {
        Self {
            max_attempts_source: MaxAttemptsSource::default(),
            interval_fn: None,
            retry_predicate: None,
            retry_after_fn: None,
            event_listeners: EventListeners::new(),
            host: String::from("<unnamed>"),
            _phantom: PhantomData,
        }
    }

    /// Fixed maximum number of attempts for every request (includes the
    /// initial attempt: `max_attempts(3)` means 1 try + 2 retries).
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts_source = MaxAttemptsSource::Fixed(max_attempts);
        self
    }

    /// Per-request max attempts, used to implement the non-idempotent-method
    /// rule: a `POST` without an idempotency key gets `max_attempts_fn`
    /// returning 1 once the request has actually been sent.
    pub fn max_attempts_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Req) -> usize + Send + Sync + 'static,
    {
        self.max_attempts_source = MaxAttemptsSource::Dynamic(Arc::new(f));
        self
    }

    pub fn fixed_backoff(mut self, duration: Duration) -> Self {
        self.interval_fn = Some(Arc::new(FixedInterval::new(duration)));
        self
    }

    /// Exponential backoff with full jitter: `base * 2^attempt`, capped by
    /// a configured max interval (see [`ExponentialBackoff::max_interval`]).
    pub fn exponential_backoff(mut self, base: Duration) -> Self {
        self.interval_fn = Some(Arc::new(ExponentialBackoff::new(base)));
        self
    }

    pub fn backoff<I>(mut self, interval_fn: I) -> Self
    where
        I: IntervalFunction + 'static,
    {
        self.interval_fn = Some(Arc::new(interval_fn));
        self
    }

    /// Decides which errors should be retried at all (independent of
    /// whether attempts remain).
    pub fn retry_on<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Some(Arc::new(predicate));
        self
    }

    /// Lets an error override the computed backoff for the next attempt,
    /// e.g. honoring a parsed `Retry-After` header.
    pub fn retry_after<F>(mut self, f: F) -> Self
    where
        F: Fn(&E) -> Option<Duration> + Send + Sync + 'static,
    {
        self.retry_after_fn = Some(Arc::new(f));
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Retry { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Error { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    pub fn on_ignored_error<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, RetryEvent::IgnoredError { .. }) {
                f();
            }
        }));
        self
    }

    pub fn build(self) -> crate::RetryLayer<Req, E> {
        let interval_fn = self
            .interval_fn
            .unwrap_or_else(|| Arc::new(ExponentialBackoff::new(Duration::from_millis(100))));

        let mut policy = RetryPolicy::new(interval_fn);
        policy.retry_predicate = self.retry_predicate;
        policy.retry_after_fn = self.retry_after_fn;

        let config = RetryConfig {
            policy,
            max_attempts_source: self.max_attempts_source,
            event_listeners: self.event_listeners,
            host: self.host,
        };

        crate::RetryLayer::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RetryLayer;

    #[test]
    fn test_builder_defaults() {
        let _layer = RetryLayer::<(), std::io::Error>::builder().build();
    }

    #[test]
    fn test_builder_custom_values() {
        let _layer = RetryLayer::<(), std::io::Error>::builder()
            .max_attempts(5)
            .fixed_backoff(Duration::from_secs(2))
            .host("erp.example.com")
            .build();
    }

    #[test]
    fn test_event_listeners() {
        let _layer = RetryLayer::<(), std::io::Error>::builder()
            .on_retry(|_, _| {})
            .on_success(|_| {})
            .build();
    }

    #[test]
    fn test_max_attempts_fn() {
        #[derive(Clone)]
        struct MyRequest {
            is_idempotent: bool,
        }

        let _layer = RetryLayer::<MyRequest, std::io::Error>::builder()
            .max_attempts_fn(|req: &MyRequest| if req.is_idempotent { 5 } else { 1 })
            .build();
    }

    #[test]
    fn test_max_attempts_source_fixed() {
        let source: MaxAttemptsSource<()> = MaxAttemptsSource::Fixed(5);
        assert_eq!(source.get_max_attempts(&()), 5);
    }

    #[test]
    fn test_max_attempts_source_dynamic() {
        #[derive(Clone)]
        struct Req {
            retries: usize,
        }

        let source: MaxAttemptsSource<Req> = MaxAttemptsSource::Dynamic(Arc::new(|req: &Req| req.retries));
        let req = Req { retries: 10 };
        assert_eq!(source.get_max_attempts(&req), 10);
    }

    #[test]
    fn test_preset_exponential_backoff() {
        let _layer = RetryLayer::<(), std::io::Error>::exponential_backoff().build();
    }

    #[test]
    fn test_preset_aggressive() {
        let _layer = RetryLayer::<(), std::io::Error>::aggressive().build();
    }

    #[test]
    fn test_preset_conservative() {
        let _layer = RetryLayer::<(), std::io::Error>::conservative().build();
    }
}
