//! Decides whether an error is retryable and how long to wait before the
//! next attempt.

use crate::backoff::IntervalFunction;
use std::sync::Arc;
use std::time::Duration;

/// A predicate deciding whether a particular error should be retried.
pub type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// A hook letting an error carry its own suggested delay (e.g. a parsed
/// `Retry-After` header), overriding the configured backoff curve for that
/// one attempt.
pub type RetryAfterFn<E> = Arc<dyn Fn(&E) -> Option<Duration> + Send + Sync>;

/// Combines a backoff curve with a retry predicate and an optional
/// retry-after override.
pub struct RetryPolicy<E> {
    interval_fn: Arc<dyn IntervalFunction>,
    pub(crate) retry_predicate: Option<RetryPredicate<E>>,
    pub(crate) retry_after_fn: Option<RetryAfterFn<E>>,
}

impl<E> RetryPolicy<E> {
    pub fn new(interval_fn: Arc<dyn IntervalFunction>) -> Self {
        Self {
            interval_fn,
            retry_predicate: None,
            retry_after_fn: None,
        }
    }

    /// Whether this error should be retried at all. Defaults to `true` when
    /// no predicate was configured, matching a bare Tower retry layer.
    pub fn should_retry(&self, error: &E) -> bool {
        match &self.retry_predicate {
            Some(predicate) => predicate(error),
            None => true,
        }
    }

    /// The delay before the next attempt. Prefers a per-error retry-after
    /// hint (e.g. a `Retry-After` header) over the configured backoff curve.
    pub fn next_backoff(&self, attempt: usize, error: &E) -> Duration {
        if let Some(retry_after_fn) = &self.retry_after_fn {
            if let Some(delay) = retry_after_fn(error) {
                return delay;
            }
        }
        self.interval_fn.interval(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::FixedInterval;

    #[test]
    fn defaults_to_retrying_everything() {
        let policy: RetryPolicy<&str> = RetryPolicy::new(Arc::new(FixedInterval::new(Duration::from_millis(10))));
        assert!(policy.should_retry(&"anything"));
    }

    #[test]
    fn predicate_filters_errors() {
        let mut policy: RetryPolicy<&str> = RetryPolicy::new(Arc::new(FixedInterval::new(Duration::from_millis(10))));
        policy.retry_predicate = Some(Arc::new(|e: &&str| *e == "retryable"));
        assert!(policy.should_retry(&"retryable"));
        assert!(!policy.should_retry(&"fatal"));
    }

    #[test]
    fn retry_after_hook_overrides_curve() {
        let mut policy: RetryPolicy<Option<Duration>> =
            RetryPolicy::new(Arc::new(FixedInterval::new(Duration::from_millis(10))));
        policy.retry_after_fn = Some(Arc::new(|hint: &Option<Duration>| *hint));

        let with_hint = Some(Duration::from_secs(2));
        assert_eq!(policy.next_backoff(0, &with_hint), Duration::from_secs(2));

        let without_hint: Option<Duration> = None;
        assert_eq!(policy.next_backoff(0, &without_hint), Duration::from_millis(10));
    }
}
