// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for digest-github

use thiserror::Error;

/// Errors that can occur while talking to GitHub
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Transport-level failure from the HTTP client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The repository URL does not end in `owner/repo`
    #[error("Invalid Github URL: {url}")]
    InvalidUrl {
        /// The URL that could not be parsed
        url: String,
    },

    /// GitHub answered with a non-success status
    #[error("GitHub returned {status} for {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// The requested URL
        url: String,
    },

    /// The response body did not have the expected shape
    #[error("Unexpected response from {url}: {message}")]
    Decode {
        /// The requested URL
        url: String,
        /// Description of the decoding problem
        message: String,
    },
}

impl GitHubError {
    /// Whether this error came back as a 404 from GitHub
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}
