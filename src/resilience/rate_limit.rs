//! Client-side rate limiting using a token bucket.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::{DEFAULT_RATE_LIMIT_BURST, DEFAULT_RATE_LIMIT_PER_SECOND};
use crate::errors::{EkdSendError, EkdSendResult};

/// Slowest sustained rate a limiter accepts: one request every 1000 seconds.
pub const MIN_RATE_PER_SECOND: f64 = 0.001;

/// Source of request permits.
///
/// The executor acquires one permit before each logical call. Implementations
/// are shared across concurrent calls and must synchronize internally.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Waits until one permit is available.
    ///
    /// Dropping the returned future abandons the wait.
    async fn acquire(&self);
}

/// Token bucket state.
#[derive(Debug)]
struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_rate: f64, // tokens per second
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: u32, refill_rate: f64) -> Self {
        Self {
            capacity: f64::from(capacity),
            tokens: f64::from(capacity),
            refill_rate,
            last_update: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_update = now;
    }

    /// Takes one token, possibly going into debt, and returns how long the
    /// caller must wait for the debt to be repaid.
    fn reserve(&mut self) -> Duration {
        self.refill();
        self.tokens -= 1.0;
        if self.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::try_from_secs_f64(-self.tokens / self.refill_rate).unwrap_or(Duration::MAX)
        }
    }

    fn refund(&mut self) {
        self.refill();
        self.tokens = (self.tokens + 1.0).min(self.capacity);
    }
}

/// Token bucket rate limiter.
///
/// Allows bursts of up to `burst` requests and refills at `per_second`
/// tokens per second.
#[derive(Debug)]
pub struct TokenBucketLimiter {
    bucket: Mutex<TokenBucket>,
}

impl TokenBucketLimiter {
    /// Creates a limiter with the given sustained rate and burst size.
    pub fn new(per_second: f64, burst: u32) -> EkdSendResult<Self> {
        if !per_second.is_finite() || per_second < MIN_RATE_PER_SECOND {
            return Err(EkdSendError::configuration(format!(
                "Rate limit must be at least {} requests per second",
                MIN_RATE_PER_SECOND
            )));
        }
        if burst == 0 {
            return Err(EkdSendError::configuration("Rate limit burst must be at least 1"));
        }

        Ok(Self {
            bucket: Mutex::new(TokenBucket::new(burst, per_second)),
        })
    }

    /// Returns the number of whole tokens currently available.
    pub fn available(&self) -> u32 {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        bucket.refill();
        // Clamped to [0, capacity], which fits in u32.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let available = bucket.tokens.max(0.0).floor() as u32;
        available
    }

    fn refund(&self) {
        self.bucket
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .refund();
    }
}

impl Default for TokenBucketLimiter {
    fn default() -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(
                DEFAULT_RATE_LIMIT_BURST,
                DEFAULT_RATE_LIMIT_PER_SECOND,
            )),
        }
    }
}

/// Returns the reserved token if the waiting caller goes away.
struct Reservation<'a> {
    limiter: &'a TokenBucketLimiter,
    completed: bool,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.limiter.refund();
        }
    }
}

#[async_trait]
impl RateLimiter for TokenBucketLimiter {
    async fn acquire(&self) {
        let wait = self
            .bucket
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reserve();

        if wait.is_zero() {
            return;
        }

        tracing::debug!(wait_ms = wait.as_millis(), "Waiting for rate limiter permit");
        let mut reservation = Reservation {
            limiter: self,
            completed: false,
        };
        tokio::time::sleep(wait).await;
        reservation.completed = true;
    }
}

/// Rate limiter that never waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRateLimiter;

#[async_trait]
impl RateLimiter for NoopRateLimiter {
    async fn acquire(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_token_bucket_reserve() {
        let mut bucket = TokenBucket::new(2, 1.0);

        assert_eq!(bucket.reserve(), Duration::ZERO);
        assert_eq!(bucket.reserve(), Duration::ZERO);
        assert!(bucket.reserve() > Duration::ZERO);
    }

    #[test]
    fn test_new_rejects_invalid_settings() {
        assert!(TokenBucketLimiter::new(0.0, 10).is_err());
        assert!(TokenBucketLimiter::new(-1.0, 10).is_err());
        assert!(TokenBucketLimiter::new(f64::NAN, 10).is_err());
        assert!(TokenBucketLimiter::new(10.0, 0).is_err());
        assert!(TokenBucketLimiter::new(1e-300, 1).is_err());
        assert!(TokenBucketLimiter::new(f64::MIN_POSITIVE, 1).is_err());
        assert!(TokenBucketLimiter::new(MIN_RATE_PER_SECOND, 1).is_ok());
        assert!(TokenBucketLimiter::new(10.0, 1).is_ok());
    }

    #[test]
    fn test_reserve_with_vanishing_rate_saturates() {
        let mut bucket = TokenBucket::new(1, 1e-300);

        assert_eq!(bucket.reserve(), Duration::ZERO);
        assert_eq!(bucket.reserve(), Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_immediate() {
        let limiter = TokenBucketLimiter::default();
        let start = Instant::now();

        for _ in 0..DEFAULT_RATE_LIMIT_BURST {
            limiter.acquire().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.available(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_refill_after_burst() {
        let limiter = TokenBucketLimiter::new(2.0, 1).unwrap();
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(500));
        assert!(start.elapsed() < Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_are_spaced() {
        let limiter = Arc::new(TokenBucketLimiter::new(10.0, 1).unwrap());
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    limiter.acquire().await;
                    Instant::now()
                })
            })
            .collect();

        let mut finished = Vec::new();
        for handle in handles {
            finished.push(handle.await.unwrap());
        }
        finished.sort();

        // One immediate permit, then one every 100ms.
        assert_eq!(finished[0].duration_since(start), Duration::ZERO);
        assert!(finished[3].duration_since(start) >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_wait_returns_token() {
        let limiter = TokenBucketLimiter::new(1.0, 1).unwrap();
        limiter.acquire().await;

        let abandoned =
            tokio::time::timeout(Duration::from_millis(100), limiter.acquire()).await;
        assert!(abandoned.is_err());

        // Without the refund the next caller would wait close to two seconds.
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_noop_limiter_never_waits() {
        let limiter = NoopRateLimiter;
        for _ in 0..1000 {
            limiter.acquire().await;
        }
    }
}
