use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Error classification consumed by [`RetryStrategy`].
pub trait RetryableError {
    fn is_retryable(&self) -> bool;

    /// Server-provided delay, when the error carries one.
    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn short_message(&self) -> String;
}

/// Exponential backoff shared by the model backend and the tool-service client.
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    pub max_attempts: u32,
    pub operation_name: String,
    initial_delay: Duration,
}

impl RetryStrategy {
    pub fn new(max_attempts: u32, operation_name: impl Into<String>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            operation_name: operation_name.into(),
            initial_delay: Duration::from_secs(1),
        }
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError,
    {
        let mut attempts = 0;
        let mut delay = self.initial_delay;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempts > 0 {
                        tracing::info!(
                            "{} succeeded after {} attempts",
                            self.operation_name,
                            attempts + 1
                        );
                    }
                    return Ok(result);
                }
                Err(e) if e.is_retryable() && attempts + 1 < self.max_attempts => {
                    attempts += 1;

                    let actual_delay = e.retry_after().unwrap_or(delay);

                    tracing::warn!(
                        "{}: attempt {}/{} failed: {}. Retrying in {:?}...",
                        self.operation_name,
                        attempts,
                        self.max_attempts,
                        e.short_message(),
                        actual_delay
                    );

                    sleep(actual_delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    if attempts > 0 {
                        tracing::warn!(
                            "{} failed after {} attempts: {}",
                            self.operation_name,
                            attempts + 1,
                            e.short_message()
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::llm_error::LlmError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryStrategy {
        RetryStrategy::new(max_attempts, "test_op").with_initial_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_retry_strategy_success_on_retry() {
        let attempt_count = AtomicU32::new(0);

        let result = fast(3)
            .execute(|| async {
                let count = attempt_count.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(LlmError::RateLimit {
                        retry_after: None,
                        message: "rate limited".to_string(),
                    })
                } else {
                    Ok("success".to_string())
                }
            })
            .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_strategy_non_retryable_error() {
        let attempt_count = AtomicU32::new(0);

        let result = fast(3)
            .execute(|| async {
                attempt_count.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(LlmError::AuthenticationError {
                    message: "invalid key".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(LlmError::AuthenticationError { .. })));
        assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_strategy_respects_max_attempts() {
        let attempt_count = AtomicU32::new(0);

        let result = fast(3)
            .execute(|| async {
                attempt_count.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(LlmError::ServerError {
                    status: 503,
                    message: "unavailable".to_string(),
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let attempt_count = AtomicU32::new(0);

        let _ = RetryStrategy::new(0, "test_op")
            .execute(|| async {
                attempt_count.fetch_add(1, Ordering::SeqCst);
                Ok::<_, LlmError>(())
            })
            .await;

        assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
    }
}
