//! Backoff interval strategies for the retry loop.

use rand::Rng;
use std::time::Duration;

/// A pluggable strategy for computing the delay before the next retry attempt.
///
/// `attempt` is 0-indexed: the delay returned for `attempt = 0` is used
/// before the *first* retry (i.e. after the initial call has already
/// failed once).
pub trait IntervalFunction: Send + Sync {
    fn interval(&self, attempt: usize) -> Duration;
}

/// Always waits the same duration between attempts.
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval {
    duration: Duration,
}

impl FixedInterval {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl IntervalFunction for FixedInterval {
    fn interval(&self, _attempt: usize) -> Duration {
        self.duration
    }
}

/// Exponential backoff with full jitter: `delay = random(0, min(max_interval,
/// base * multiplier^attempt))`.
///
/// Full jitter (rather than a fixed exponential curve) avoids every client
/// retrying a struggling host in lockstep. Set [`Self::full_jitter`] to
/// `false` to get the un-jittered curve instead.
#[derive(Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    multiplier: f64,
    max_interval: Duration,
    full_jitter: bool,
}

impl ExponentialBackoff {
    /// `base` is the delay before the first retry (`attempt = 0`).
    /// Default multiplier is 2.0, default max_interval is 30s, full jitter on.
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            multiplier: 2.0,
            max_interval: Duration::from_secs(30),
            full_jitter: true,
        }
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }

    pub fn full_jitter(mut self, enabled: bool) -> Self {
        self.full_jitter = enabled;
        self
    }

    fn capped_exponential(&self, attempt: usize) -> Duration {
        let exp = self.multiplier.powi(attempt as i32);
        let millis = (self.base.as_millis() as f64 * exp).min(self.max_interval.as_millis() as f64);
        Duration::from_millis(millis.max(0.0) as u64)
    }
}

impl IntervalFunction for ExponentialBackoff {
    fn interval(&self, attempt: usize) -> Duration {
        let capped = self.capped_exponential(attempt);
        if !self.full_jitter || capped.is_zero() {
            return capped;
        }
        let millis = rand::rng().random_range(0..=capped.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

/// Exponential backoff with a bounded randomization factor applied around
/// the curve (`interval +/- interval * randomization_factor`), rather than
/// full jitter down to zero. Useful when a minimum spacing between retries
/// is still wanted.
#[derive(Clone)]
pub struct ExponentialRandomBackoff {
    inner: ExponentialBackoff,
    randomization_factor: f64,
}

impl ExponentialRandomBackoff {
    pub fn new(base: Duration) -> Self {
        Self {
            inner: ExponentialBackoff::new(base).full_jitter(false),
            randomization_factor: 0.5,
        }
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.inner = self.inner.multiplier(multiplier);
        self
    }

    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.inner = self.inner.max_interval(max_interval);
        self
    }

    pub fn randomization_factor(mut self, factor: f64) -> Self {
        self.randomization_factor = factor.clamp(0.0, 1.0);
        self
    }
}

impl IntervalFunction for ExponentialRandomBackoff {
    fn interval(&self, attempt: usize) -> Duration {
        let base = self.inner.capped_exponential(attempt);
        let delta = base.as_millis() as f64 * self.randomization_factor;
        let low = (base.as_millis() as f64 - delta).max(0.0) as u64;
        let high = (base.as_millis() as f64 + delta) as u64;
        let millis = if high > low {
            rand::rng().random_range(low..=high)
        } else {
            low
        };
        Duration::from_millis(millis)
    }
}

/// An interval function backed by a plain closure, for callers who want a
/// custom curve without implementing the trait.
pub struct FnInterval<F>(F)
where
    F: Fn(usize) -> Duration + Send + Sync;

impl<F> FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> IntervalFunction for FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    fn interval(&self, attempt: usize) -> Duration {
        (self.0)(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_interval_is_constant() {
        let f = FixedInterval::new(Duration::from_millis(50));
        assert_eq!(f.interval(0), Duration::from_millis(50));
        assert_eq!(f.interval(10), Duration::from_millis(50));
    }

    #[test]
    fn exponential_backoff_grows_and_caps() {
        let f = ExponentialBackoff::new(Duration::from_millis(100))
            .full_jitter(false)
            .max_interval(Duration::from_secs(1));
        assert_eq!(f.interval(0), Duration::from_millis(100));
        assert_eq!(f.interval(1), Duration::from_millis(200));
        assert_eq!(f.interval(2), Duration::from_millis(400));
        assert_eq!(f.interval(10), Duration::from_secs(1));
    }

    #[test]
    fn full_jitter_stays_within_bound() {
        let f = ExponentialBackoff::new(Duration::from_millis(100)).max_interval(Duration::from_secs(1));
        for attempt in 0..5 {
            let cap = f.capped_exponential(attempt);
            for _ in 0..20 {
                let d = f.interval(attempt);
                assert!(d <= cap);
            }
        }
    }

    #[test]
    fn randomized_backoff_stays_near_curve() {
        let f = ExponentialRandomBackoff::new(Duration::from_millis(100)).randomization_factor(0.2);
        let d = f.interval(0);
        assert!(d >= Duration::from_millis(80) && d <= Duration::from_millis(120));
    }

    #[test]
    fn fn_interval_delegates_to_closure() {
        let f = FnInterval::new(|attempt: usize| Duration::from_millis(attempt as u64 * 10));
        assert_eq!(f.interval(3), Duration::from_millis(30));
    }
}
