use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Request budget shared by every fetch issued through one adapter.
///
/// Concurrent ticker fetches clone the throttle; all clones draw from the same
/// governor bucket.
#[derive(Clone)]
pub struct RequestThrottle {
    limiter: Arc<DirectRateLimiter>,
    quota_window: Duration,
    quota_limit: u32,
}

impl std::fmt::Debug for RequestThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestThrottle")
            .field("quota_window", &self.quota_window)
            .field("quota_limit", &self.quota_limit)
            .finish()
    }
}

impl RequestThrottle {
    /// Allows `quota_limit` requests per `quota_window`, all of them as a burst.
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        let quota = quota_from_window(quota_window, quota_limit);
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            quota_window,
            quota_limit: quota_limit.max(1),
        }
    }

    /// Non-blocking check that spends one cell when budget is available.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Waits until the bucket grants one request.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    pub const fn quota_limit(&self) -> u32 {
        self.quota_limit
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let safe_limit = NonZeroU32::new(quota_limit.max(1)).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell =
        (quota_window.as_secs_f64() / f64::from(safe_limit.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(safe_limit))
        .allow_burst(safe_limit)
}
