// Retry logic - exponential backoff over the admission queue
use crate::application::constants::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_RETRIES};
use crate::application::queue::AdmissionQueue;
use crate::domain::{QueueError, QueueEvent};
use crate::error::{AppError, Result};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the given backoff delay
    Retry(Duration),
    /// Attempts exhausted, surface the last error
    GiveUp,
}

/// Bounded retry with pure exponential backoff (no jitter)
///
/// Backoff formula:
/// delay = initial_delay * 2^attempt
///
/// With the defaults (3 retries, 1s) an always-failing operation runs 4
/// times, waiting 1s, 2s and 4s between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Arguments
    /// * `max_retries` - Retries after the first attempt (0 = try once)
    /// * `initial_delay` - Delay before the first retry, must be non-zero
    pub fn new(max_retries: u32, initial_delay: Duration) -> Result<Self> {
        if initial_delay.is_zero() {
            return Err(AppError::Validation(
                "Retry initial delay must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            max_retries,
            initial_delay,
        })
    }

    /// Single attempt, no retry
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Delay after failed attempt `attempt` (0-indexed), saturating on overflow
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// Decide what follows a failure of attempt `attempt` (0-indexed)
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_retries {
            RetryDecision::GiveUp
        } else {
            RetryDecision::Retry(self.delay_for(attempt))
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}

/// Label shown for an attempt; retries carry their number
pub fn attempt_label(label: &str, attempt: u32, max_retries: u32) -> String {
    if attempt == 0 {
        label.to_string()
    } else {
        format!("{} (retry {}/{})", label, attempt, max_retries)
    }
}

impl AdmissionQueue {
    /// Submit with bounded retry and exponential backoff
    ///
    /// Each attempt is a fresh `enqueue` on this queue, so retries wait for a
    /// slot and line up behind unrelated work like any other submission. The
    /// operation runs at most `max_retries + 1` times and must be safe to
    /// repeat. The error returned is the last attempt's, unchanged.
    ///
    /// `Cleared` and `Abandoned` results end the loop immediately.
    ///
    /// # Example
    /// ```text
    /// let body = queue
    ///     .enqueue_with_retry("fetch feed", RetryPolicy::default(), move || {
    ///         let client = client.clone();
    ///         async move { client.get_feed().await }
    ///     })
    ///     .await?;
    /// ```
    pub async fn enqueue_with_retry<F, Fut, T, E>(
        &self,
        label: impl Into<String>,
        policy: RetryPolicy,
        operation: F,
    ) -> std::result::Result<T, QueueError<E>>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let label = label.into();
        let operation = Arc::new(operation);
        let mut attempt: u32 = 0;

        loop {
            let op = Arc::clone(&operation);
            let result = self
                .enqueue(
                    attempt_label(&label, attempt, policy.max_retries()),
                    move || op(),
                )
                .await;

            let error = match result {
                Ok(value) => {
                    if attempt > 0 {
                        info!(
                            queue = %self.name(),
                            label = %label,
                            attempt = attempt,
                            "Operation succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            match policy.decide(attempt) {
                RetryDecision::GiveUp => {
                    self.emit(&QueueEvent::RetryExhausted {
                        queue: self.name().to_string(),
                        label,
                        attempts: attempt + 1,
                        error: error.to_string(),
                    });
                    return Err(error);
                }
                RetryDecision::Retry(delay) => {
                    self.emit(&QueueEvent::RetryScheduled {
                        queue: self.name().to_string(),
                        label: label.clone(),
                        attempt: attempt + 1,
                        delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error: error.to_string(),
                    });
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
