//! Resilience layer for the EKDSend client.
//!
//! Provides the client-side rate limiter and the retry policy used by the
//! request executor.

mod rate_limit;
mod retry;

pub use rate_limit::{NoopRateLimiter, RateLimiter, TokenBucketLimiter, MIN_RATE_PER_SECOND};
pub use retry::{RetryConfig, RetryPolicy};
