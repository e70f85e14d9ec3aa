use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::provider_policy::ProviderPolicy;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Client-side pacing shared by every request an adapter issues.
#[derive(Clone)]
pub struct Throttle {
    limiter: Arc<DirectRateLimiter>,
}

impl std::fmt::Debug for Throttle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttle").finish_non_exhaustive()
    }
}

impl Throttle {
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(
                quota_window,
                quota_limit,
            ))),
        }
    }

    pub fn from_policy(policy: &ProviderPolicy) -> Self {
        Self::new(policy.quota_window, policy.quota_limit)
    }

    /// Waits until the quota admits one more request.
    pub async fn until_ready(&self) {
        self.limiter.until_ready().await;
    }

    /// Non-blocking check; on exhaustion returns the time until a slot frees up.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        self.limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let burst = NonZeroU32::new(quota_limit).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(burst.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_burst_then_reports_wait() {
        let throttle = Throttle::new(Duration::from_secs(60), 2);

        assert!(throttle.try_acquire().is_ok());
        assert!(throttle.try_acquire().is_ok());

        let wait = throttle.try_acquire().expect_err("third request exceeds quota");
        assert!(wait > Duration::ZERO);
        assert!(wait <= Duration::from_secs(30));
    }

    #[test]
    fn zero_limit_is_treated_as_one() {
        let throttle = Throttle::new(Duration::from_secs(60), 0);
        assert!(throttle.try_acquire().is_ok());
        assert!(throttle.try_acquire().is_err());
    }

    #[tokio::test]
    async fn until_ready_returns_immediately_with_budget() {
        let throttle = Throttle::from_policy(&ProviderPolicy::greenhouse_default());
        throttle.until_ready().await;
        assert!(throttle.try_acquire().is_ok());
    }
}
