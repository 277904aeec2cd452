//! Completion client error types.

use lessonlens_core::Error;
use std::sync::Arc;

/// Errors from the completion API client.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// No API key configured.
    #[error("missing API key: LESSONLENS_ANTHROPIC_API_KEY not set")]
    MissingApiKey,

    /// Authentication failed (invalid API key).
    #[error("authentication failed: invalid API key")]
    AuthError,

    /// Rate limited by the API.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl LlmError {
    /// Whether a later attempt of the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited | LlmError::Timeout | LlmError::Network(_) => true,
            LlmError::HttpError { status } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { LlmError::Timeout } else { LlmError::Network(Arc::new(err)) }
    }
}

impl From<LlmError> for Error {
    fn from(err: LlmError) -> Self {
        Error::ModelError(err.to_string())
    }
}
