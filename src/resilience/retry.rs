//! Retry policy implementation.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::config::DEFAULT_MAX_RETRIES;
use crate::errors::{EkdSendError, EkdSendResult};

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first send.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Delay multiplier for exponential backoff.
    pub multiplier: f64,
    /// Whether to add jitter.
    pub jitter: bool,
    /// Wait for the server's `retry_after` on 429 instead of the schedule.
    pub honor_retry_after: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: false,
            honor_retry_after: false,
        }
    }
}

impl RetryConfig {
    /// Creates a new retry configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of retries.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the initial delay.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the multiplier.
    pub fn multiplier(mut self, mult: f64) -> Self {
        self.multiplier = mult;
        self
    }

    /// Sets whether to use jitter.
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Sets whether a 429 `retry_after` overrides the backoff schedule.
    pub fn honor_retry_after(mut self, honor: bool) -> Self {
        self.honor_retry_after = honor;
        self
    }

    /// Creates a configuration with no retries.
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }
}

/// Retry policy with exponential backoff.
///
/// Attempts run strictly one after another. The caller's cancellation
/// token is observed during each attempt and during each backoff sleep.
#[derive(Debug)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Creates a new retry policy.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Creates a retry policy with default configuration.
    pub fn default_policy() -> Self {
        Self::new(RetryConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Executes an operation with retries.
    ///
    /// Errors for which [`EkdSendError::is_retryable`] is false are returned
    /// immediately. Once retries are exhausted the last error is returned.
    #[instrument(skip(self, cancel, operation), fields(max_retries = self.config.max_retries))]
    pub async fn execute<F, Fut, T>(
        &self,
        cancel: &CancellationToken,
        operation: F,
    ) -> EkdSendResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = EkdSendResult<T>>,
    {
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(EkdSendError::Cancelled);
            }

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(EkdSendError::Cancelled),
                result = operation() => result,
            };

            match result {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !err.is_retryable() || attempt >= self.config.max_retries {
                        if attempt > 0 && err.is_retryable() {
                            tracing::warn!(
                                attempts = attempt + 1,
                                error = %err,
                                "Giving up after retries"
                            );
                        }
                        return Err(err);
                    }

                    let delay = self.calculate_delay(attempt, &err);

                    tracing::info!(
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis(),
                        error = %err,
                        "Retrying after error"
                    );

                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Err(EkdSendError::Cancelled),
                        () = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Calculates the delay for a retry attempt.
    fn calculate_delay(&self, attempt: u32, error: &EkdSendError) -> Duration {
        if self.config.honor_retry_after {
            if let Some(retry_after) = error.retry_after() {
                return retry_after.min(self.config.max_delay);
            }
        }

        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base_delay =
            self.config.initial_delay.as_secs_f64() * self.config.multiplier.powi(exponent);
        let delay_secs = base_delay.min(self.config.max_delay.as_secs_f64());

        // Add jitter if enabled (0-25% random variation)
        let delay_secs = if self.config.jitter {
            let jitter = rand::random::<f64>() * 0.25;
            delay_secs * (1.0 + jitter)
        } else {
            delay_secs
        };

        Duration::try_from_secs_f64(delay_secs).unwrap_or(self.config.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::default_policy()
    }
}
