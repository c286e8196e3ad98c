//! Per-provider quota gate.
//!
//! A [`RateLimiter`] tracks two sliding windows (one second, one hour) for a
//! single upstream account. Exhausting the second window suspends the caller
//! until it rolls over; exhausting the hour window fails immediately, since
//! that wait is far longer than any request should block.

use crate::error::DomainCheckError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

const SECOND: Duration = Duration::from_secs(1);
const HOUR: Duration = Duration::from_secs(3600);

/// Configured quota for one provider account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimit {
    pub per_second: u32,
    pub per_hour: u32,
}

impl RateLimit {
    pub fn new(per_second: u32, per_hour: u32) -> Self {
        Self {
            per_second,
            per_hour,
        }
    }
}

/// Counter for one window granularity.
#[derive(Debug)]
struct Window {
    start: Instant,
    count: u32,
    period: Duration,
}

impl Window {
    fn new(period: Duration, now: Instant) -> Self {
        Self {
            start: now,
            count: 0,
            period,
        }
    }

    /// Reset the window if its period has fully elapsed.
    fn roll(&mut self, now: Instant) {
        if now.duration_since(self.start) >= self.period {
            self.start = now;
            self.count = 0;
        }
    }

    fn remaining(&self, now: Instant) -> Duration {
        (self.start + self.period).saturating_duration_since(now)
    }
}

#[derive(Debug)]
struct LimiterState {
    second: Window,
    hour: Window,
}

/// Point-in-time view of a limiter's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitSnapshot {
    pub this_second: u32,
    pub this_hour: u32,
}

/// Sliding-window rate limiter shared by every call against one provider.
///
/// Created once at startup and handed to its adapter as `Arc<RateLimiter>`.
/// All counter mutation happens under a single async mutex, so concurrent
/// batch members can never over-admit past a limit.
#[derive(Debug)]
pub struct RateLimiter {
    provider: String,
    limits: RateLimit,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    /// Create a limiter for `provider`. Both limits must be non-zero.
    pub fn new<P: Into<String>>(provider: P, limits: RateLimit) -> Result<Self, DomainCheckError> {
        let provider = provider.into();
        if limits.per_second == 0 || limits.per_hour == 0 {
            return Err(DomainCheckError::config(format!(
                "Rate limits for '{}' must be greater than zero",
                provider
            )));
        }

        let now = Instant::now();
        Ok(Self {
            provider,
            limits,
            state: Mutex::new(LimiterState {
                second: Window::new(SECOND, now),
                hour: Window::new(HOUR, now),
            }),
        })
    }

    /// Reserve one call slot.
    ///
    /// Suspends while the per-second window is full, fails with
    /// `RateLimitExceeded` when the hourly window is full.
    pub async fn acquire(&self) -> Result<(), DomainCheckError> {
        // The guard is held across the per-second sleep; queued callers
        // are admitted in order once the window rolls.
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.second.roll(now);
        state.hour.roll(now);

        if state.hour.count >= self.limits.per_hour {
            let retry_after = state.hour.remaining(now);
            warn!(
                provider = %self.provider,
                retry_after_secs = retry_after.as_secs(),
                "hourly quota exhausted"
            );
            return Err(DomainCheckError::rate_limited(
                self.provider.clone(),
                Some(retry_after),
            ));
        }

        if state.second.count >= self.limits.per_second {
            let wait = state.second.remaining(now);
            debug!(provider = %self.provider, wait_ms = wait.as_millis() as u64, "per-second quota full, waiting");
            tokio::time::sleep(wait).await;

            let now = Instant::now();
            state.second.start = now;
            state.second.count = 0;
            state.hour.roll(now);
        }

        state.second.count += 1;
        state.hour.count += 1;
        Ok(())
    }

    /// Current counters, after rolling any expired window.
    pub async fn snapshot(&self) -> RateLimitSnapshot {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.second.roll(now);
        state.hour.roll(now);
        RateLimitSnapshot {
            this_second: state.second.count,
            this_hour: state.hour.count,
        }
    }

    pub fn limits(&self) -> RateLimit {
        self.limits
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_zero_limits_rejected() {
        assert!(RateLimiter::new("namecom", RateLimit::new(0, 10)).is_err());
        assert!(RateLimiter::new("namecom", RateLimit::new(10, 0)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_window_suspends_instead_of_failing() {
        let limiter = RateLimiter::new("namecom", RateLimit::new(3, 1000)).unwrap();
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await.unwrap();
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        // Fourth call in the same second waits for the window to roll
        limiter.acquire().await.unwrap();
        assert!(start.elapsed() >= SECOND);

        let snapshot = limiter.snapshot().await;
        assert_eq!(snapshot.this_second, 1);
        assert_eq!(snapshot.this_hour, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hour_window_fails_fast() {
        let limiter = RateLimiter::new("namecom", RateLimit::new(10, 2)).unwrap();
        limiter.acquire().await.unwrap();
        limiter.acquire().await.unwrap();

        let start = Instant::now();
        let err = limiter.acquire().await.unwrap_err();
        assert_eq!(start.elapsed(), Duration::ZERO);

        match err {
            DomainCheckError::RateLimitExceeded {
                provider,
                retry_after,
            } => {
                assert_eq!(provider, "namecom");
                let retry_after = retry_after.unwrap();
                assert!(retry_after > Duration::ZERO && retry_after <= HOUR);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hour_window_rolls_by_elapsed_time() {
        let limiter = RateLimiter::new("namecom", RateLimit::new(10, 1)).unwrap();
        limiter.acquire().await.unwrap();
        assert!(limiter.acquire().await.is_err());

        tokio::time::advance(HOUR).await;
        limiter.acquire().await.unwrap();
        assert_eq!(limiter.snapshot().await.this_hour, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_acquisitions_never_over_admit() {
        let limiter = Arc::new(RateLimiter::new("namecom", RateLimit::new(5, 100)).unwrap());
        let start = Instant::now();

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    limiter.acquire().await.unwrap();
                    Instant::now()
                })
            })
            .collect();

        let mut admitted = Vec::new();
        for handle in handles {
            admitted.push(handle.await.unwrap().duration_since(start));
        }

        // 12 calls at 5/s need three windows
        let in_first = admitted.iter().filter(|d| **d < SECOND).count();
        let in_second = admitted
            .iter()
            .filter(|d| **d >= SECOND && **d < SECOND * 2)
            .count();
        assert_eq!(in_first, 5);
        assert_eq!(in_second, 5);
        assert_eq!(limiter.snapshot().await.this_hour, 12);
    }
}
