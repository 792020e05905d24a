use std::time::Duration;
use thiserror::Error;

use crate::backends::strategy::RetryableError;

#[derive(Debug, Clone, Error)]
pub enum ArcadeError {
    #[error("Arcade authentication failed: {message}")]
    Authentication { message: String },

    #[error("Arcade rate limit: {message}")]
    RateLimit {
        retry_after: Option<u64>,
        message: String,
    },

    #[error("Arcade server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Arcade API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error talking to Arcade: {0}")]
    Network(String),

    #[error("Unexpected response from Arcade: {0}")]
    Decode(String),

    #[error("Arcade client configuration error: {0}")]
    Configuration(String),
}

impl ArcadeError {
    pub fn from_status(status: u16, retry_after: Option<u64>, body: String) -> Self {
        let message = extract_message(&body);
        match status {
            401 | 403 => ArcadeError::Authentication { message },
            429 => ArcadeError::RateLimit {
                retry_after,
                message,
            },
            500..=599 => ArcadeError::Server { status, message },
            _ => ArcadeError::Api { status, message },
        }
    }
}

/// Arcade error bodies are JSON with a `message` field; fall back to the raw text.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

impl RetryableError for ArcadeError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            ArcadeError::RateLimit { .. } | ArcadeError::Server { .. } | ArcadeError::Network(_)
        )
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            ArcadeError::RateLimit {
                retry_after: Some(seconds),
                ..
            } => Some(Duration::from_secs(*seconds)),
            _ => None,
        }
    }

    fn short_message(&self) -> String {
        match self {
            ArcadeError::Authentication { .. } => "Authentication error".to_string(),
            ArcadeError::RateLimit { .. } => "Rate limit hit".to_string(),
            ArcadeError::Server { status, .. } => format!("Server error ({})", status),
            ArcadeError::Api { status, .. } => format!("API error ({})", status),
            ArcadeError::Network(_) => "Network error".to_string(),
            ArcadeError::Decode(_) => "Invalid response".to_string(),
            ArcadeError::Configuration(_) => "Configuration error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_variants() {
        assert!(matches!(
            ArcadeError::from_status(401, None, String::new()),
            ArcadeError::Authentication { .. }
        ));
        assert!(matches!(
            ArcadeError::from_status(429, Some(3), String::new()),
            ArcadeError::RateLimit {
                retry_after: Some(3),
                ..
            }
        ));
        assert!(matches!(
            ArcadeError::from_status(503, None, String::new()),
            ArcadeError::Server { status: 503, .. }
        ));
        assert!(matches!(
            ArcadeError::from_status(404, None, String::new()),
            ArcadeError::Api { status: 404, .. }
        ));
    }

    #[test]
    fn json_message_is_extracted() {
        let err = ArcadeError::from_status(
            400,
            None,
            r#"{"name":"bad_request","message":"toolkit not found"}"#.to_string(),
        );
        assert_eq!(err.to_string(), "Arcade API error (400): toolkit not found");

        let raw = ArcadeError::from_status(400, None, "plain failure\n".to_string());
        assert_eq!(raw.to_string(), "Arcade API error (400): plain failure");
    }
}
