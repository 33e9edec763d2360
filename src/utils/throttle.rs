// Outbound request pacing for third-party providers

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Waits until the next outbound call is allowed
#[async_trait]
pub trait Throttle: Send + Sync {
    async fn acquire(&self);
}

/// Token bucket backed by governor
#[derive(Clone)]
pub struct GovernorThrottle {
    limiter: Arc<DirectRateLimiter>,
}

impl GovernorThrottle {
    /// `requests_per_second` of 0 is treated as 1
    pub fn per_second(requests_per_second: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self::with_quota(Quota::per_second(rate).allow_burst(NonZeroU32::MIN))
    }

    /// One request per `period`; `None` when the period is zero
    pub fn every(period: Duration) -> Option<Self> {
        Quota::with_period(period).map(Self::with_quota)
    }

    pub fn with_quota(quota: Quota) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

#[async_trait]
impl Throttle for GovernorThrottle {
    async fn acquire(&self) {
        self.limiter.until_ready().await;
    }
}

/// No pacing at all
#[derive(Debug, Clone, Copy, Default)]
pub struct Unthrottled;

#[async_trait]
impl Throttle for Unthrottled {
    async fn acquire(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_first_permit_is_immediate() {
        let throttle = GovernorThrottle::per_second(1);
        let started = Instant::now();
        throttle.acquire().await;
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_second_permit_waits_for_the_period() {
        let throttle = GovernorThrottle::every(Duration::from_millis(200)).unwrap();
        throttle.acquire().await;
        let started = Instant::now();
        throttle.acquire().await;
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[test]
    fn test_zero_period_is_rejected() {
        assert!(GovernorThrottle::every(Duration::ZERO).is_none());
    }
}
