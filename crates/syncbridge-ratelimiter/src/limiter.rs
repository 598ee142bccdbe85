use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Result of attempting to acquire a token.
/// `Ok(wait_duration)` means a token was granted, possibly after waiting.
/// `Err(timeout)` means no token became available within the timeout.
type AcquireResult = Result<Duration, Duration>;

/// A continuously-refilling token bucket for one host.
///
/// Capacity is `burst` tokens; the bucket refills at `rps` tokens per
/// second, capped at `burst`. This lets a caller spend a burst of queued
/// work immediately after an idle period, then settles to the steady-state
/// rate — unlike a fixed window, there is no request pile-up at period
/// boundaries.
#[derive(Debug)]
struct TokenBucketState {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucketState {
    fn new(rps: f64, burst: u32) -> Self {
        Self {
            capacity: burst.max(1) as f64,
            tokens: burst.max(1) as f64,
            refill_per_sec: rps.max(0.0),
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        if elapsed <= 0.0 {
            return;
        }
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    fn time_until_next_token(&self) -> Duration {
        if self.refill_per_sec <= 0.0 {
            return Duration::MAX;
        }
        let deficit = (1.0 - self.tokens).max(0.0);
        Duration::from_secs_f64(deficit / self.refill_per_sec)
    }

    fn try_acquire(&mut self, timeout: Duration) -> AcquireResult {
        let now = Instant::now();
        self.refill(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            return Ok(Duration::ZERO);
        }

        let wait = self.time_until_next_token();
        if wait > timeout {
            Err(timeout)
        } else {
            Ok(wait)
        }
    }

    fn available(&mut self) -> f64 {
        self.refill(Instant::now());
        self.tokens
    }
}

/// A shared, lock-guarded token bucket that can be cloned cheaply and
/// driven from multiple concurrent callers.
#[derive(Clone)]
pub(crate) struct SharedTokenBucket {
    state: Arc<Mutex<TokenBucketState>>,
    queue_timeout: Duration,
}

impl SharedTokenBucket {
    pub(crate) fn new(rps: f64, burst: u32, queue_timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(TokenBucketState::new(rps, burst))),
            queue_timeout,
        }
    }

    /// Attempts to acquire one token, waiting up to `queue_timeout` for a
    /// refill. Returns the time spent waiting on success, or `Err(())` if
    /// the timeout elapsed without a token becoming available.
    pub(crate) async fn acquire(&self) -> Result<Duration, ()> {
        let deadline = Instant::now() + self.queue_timeout;
        let mut total_wait = Duration::ZERO;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let outcome = {
                let mut state = self.state.lock().unwrap();
                state.try_acquire(remaining)
            };

            match outcome {
                Ok(Duration::ZERO) => return Ok(total_wait),
                Ok(wait) => {
                    sleep(wait).await;
                    total_wait += wait;
                    // Loop again: the refill calculation is conservative,
                    // so a second attempt after sleeping should succeed.
                }
                Err(_) => return Err(()),
            }
        }
    }

    pub(crate) fn available_tokens(&self) -> f64 {
        self.state.lock().unwrap().available()
    }
}
