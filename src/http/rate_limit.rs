//! Client-side request rate limiting
//!
//! A single token bucket (governor) shared by every request a transport sends,
//! so parallel endpoints together stay under the upstream quota.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectLimiter = Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Request quota for one transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Sustained requests per second
    pub requests_per_second: NonZeroU32,
    /// Requests allowed back to back before throttling starts
    pub burst: NonZeroU32,
}

impl RateLimiterConfig {
    /// Allow `requests_per_second`, with a burst of the same size
    ///
    /// A zero rate is raised to one request per second.
    pub fn per_second(requests_per_second: u32) -> Self {
        let rate = non_zero(requests_per_second);
        Self {
            requests_per_second: rate,
            burst: rate,
        }
    }

    /// Set the burst size
    #[must_use]
    pub fn with_burst(mut self, burst: u32) -> Self {
        self.burst = non_zero(burst);
        self
    }
}

/// Token bucket shared by clones
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<DirectLimiter>,
    config: RateLimiterConfig,
}

impl RateLimiter {
    /// Create a limiter for a quota
    pub fn new(config: &RateLimiterConfig) -> Self {
        let quota = Quota::per_second(config.requests_per_second).allow_burst(config.burst);
        Self {
            bucket: Arc::new(Governor::direct(quota)),
            config: *config,
        }
    }

    /// Wait for a permit
    pub async fn wait(&self) {
        self.bucket.until_ready().await;
    }

    /// Take a permit if one is available now
    pub fn try_acquire(&self) -> bool {
        self.bucket.check().is_ok()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("requests_per_second", &self.config.requests_per_second)
            .field("burst", &self.config.burst)
            .finish_non_exhaustive()
    }
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

#[cfg(test)]
mod rate_limit_tests {
    use super::*;

    #[test]
    fn test_per_second_quota() {
        let config = RateLimiterConfig::per_second(4);
        assert_eq!(config.requests_per_second.get(), 4);
        assert_eq!(config.burst.get(), 4);
        assert_eq!(config.with_burst(9).burst.get(), 9);
    }

    #[test]
    fn test_burst_is_exhausted() {
        let limiter = RateLimiter::new(&RateLimiterConfig::per_second(10).with_burst(3));
        assert!((0..3).all(|_| limiter.try_acquire()));
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_clones_share_one_bucket() {
        let limiter = RateLimiter::new(&RateLimiterConfig::per_second(1));
        let clone = limiter.clone();
        assert!(limiter.try_acquire());
        assert!(!clone.try_acquire());
    }

    #[test]
    fn test_zero_quota_is_raised_to_one() {
        let config = RateLimiterConfig::per_second(0).with_burst(0);
        assert_eq!(config.requests_per_second.get(), 1);
        assert!(RateLimiter::new(&config).try_acquire());
    }

    #[tokio::test]
    async fn test_wait_returns_within_burst() {
        let limiter = RateLimiter::new(&RateLimiterConfig::per_second(100));
        limiter.wait().await;
        limiter.wait().await;
    }
}
