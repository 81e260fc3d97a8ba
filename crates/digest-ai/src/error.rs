//! Error types for digest-ai

use thiserror::Error;

/// Errors that can occur while summarizing a diff
#[derive(Debug, Error)]
pub enum AiError {
    /// Transport-level failure from the HTTP client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status
    #[error("AI provider returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// The response body could not be decoded
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The summarizer is missing required configuration
    #[error("AI provider not configured: {message}")]
    NotConfigured {
        /// What is missing
        message: String,
    },
}
