//! Retry with exponential backoff for endpoint operations

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts on top of the first try
    pub max_retries: u32,

    /// Base delay in milliseconds for exponential backoff
    pub base_delay_ms: u64,

    /// Maximum delay in milliseconds (caps exponential growth)
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 5_000,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryConfig {
    /// A configuration with custom max retries and default delays.
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Delay before the given attempt (attempt 0 is the first try).
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms = if attempt == 0 {
            0
        } else {
            let exponential = self
                .base_delay_ms
                .saturating_mul(2u64.saturating_pow(attempt - 1));
            exponential.min(self.max_delay_ms)
        };
        Duration::from_millis(delay_ms)
    }
}

/// Run `operation` until it succeeds, a non-retryable error occurs, or the
/// retry budget is exhausted. `should_retry` decides which errors warrant
/// another attempt.
///
/// # Errors
///
/// The last error returned by `operation`.
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let delay = config.calculate_delay(attempt);
            debug!(
                attempt,
                delay_ms = delay.as_millis(),
                "retrying operation after delay"
            );
            tokio::time::sleep(delay).await;
        }

        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(attempt, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => {
                if !should_retry(&e) {
                    warn!(error = %e, "non-retryable error encountered");
                    return Err(e);
                }
                warn!(
                    attempt,
                    max_retries = config.max_retries,
                    error = %e,
                    "operation failed, will retry"
                );
                last_error = Some(e);
            }
        }
    }

    Err(last_error.expect("at least one attempt ran"))
}
