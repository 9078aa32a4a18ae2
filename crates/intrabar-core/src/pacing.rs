use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Fixed spacing between consecutive provider requests.
///
/// The first request goes out immediately; every later one waits until
/// `delay` has passed since the previous slot. A zero delay disables pacing.
pub struct RequestPacer {
    limiter: Option<DirectRateLimiter>,
    delay: Duration,
}

impl RequestPacer {
    pub fn new(delay: Duration) -> Self {
        let limiter = Quota::with_period(delay).map(RateLimiter::direct);
        Self { limiter, delay }
    }

    pub fn from_millis(delay_ms: u64) -> Self {
        Self::new(Duration::from_millis(delay_ms))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// Waits for the next request slot.
    pub async fn ready(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

impl std::fmt::Debug for RequestPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPacer")
            .field("delay", &self.delay)
            .finish()
    }
}
