//! Standalone rate limiting for `/sync/pause` (spec §4.8: "excessive calls
//! return 429"). Grounded on the same continuously-refilling token-bucket
//! algorithm as `syncbridge-ratelimiter::limiter::TokenBucketState`, but
//! implemented directly rather than as a generic `tower::Layer` — that
//! layer is typed around `Service<Req, Response = Resp, Error = SyncError>`
//! for the outbound HTTP client stack, not axum's request/response types,
//! and a control endpoint wants an immediate reject, not a queued wait.

use std::sync::Mutex;
use std::time::Instant;

struct BucketState {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl BucketState {
    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        if elapsed <= 0.0 {
            return;
        }
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }
}

/// A non-queuing token bucket: `try_acquire` either grants a token now or
/// refuses outright, so callers can respond `429` immediately.
pub struct LocalRateLimiter {
    state: Mutex<BucketState>,
}

impl LocalRateLimiter {
    pub fn new(rps: f64, burst: u32) -> Self {
        let capacity = burst.max(1) as f64;
        Self {
            state: Mutex::new(BucketState {
                capacity,
                tokens: capacity,
                refill_per_sec: rps.max(0.0),
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.refill(Instant::now());
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}
