use std::time::Duration;
use thiserror::Error;

use super::strategy::RetryableError;

#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("Rate limit: {message}")]
    RateLimit {
        retry_after: Option<u64>,
        message: String,
    },
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },
    #[error("Authentication error: {message}")]
    AuthenticationError { message: String },
    #[error("Network error: {message}")]
    NetworkError { message: String },
    #[error("Error: {message}")]
    Other { message: String },
}

impl RetryableError for LlmError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimit { .. } | LlmError::ServerError { .. } | LlmError::NetworkError { .. }
        )
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimit {
                retry_after: Some(seconds),
                ..
            } => Some(Duration::from_secs(*seconds)),
            _ => None,
        }
    }

    fn short_message(&self) -> String {
        match self {
            LlmError::RateLimit { .. } => "Rate limit hit".to_string(),
            LlmError::ServerError { status, .. } => format!("Server error ({})", status),
            LlmError::AuthenticationError { .. } => "Authentication error".to_string(),
            LlmError::NetworkError { .. } => "Network error".to_string(),
            LlmError::Other { .. } => "Error occurred".to_string(),
        }
    }
}
