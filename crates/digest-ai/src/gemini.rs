// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Gemini summarization client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AiError;
use crate::prompt::{DEFAULT_MAX_DIFF_CHARS, build_prompt};

/// Default Gemini API base URL
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Header carrying the API key, kept out of the request URL
pub const API_KEY_HEADER: &str = "x-goog-api-key";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_ERROR_BODY: usize = 512;

/// Something that can summarize a commit diff
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize a unified diff; an empty string means "no summary"
    async fn summarize_diff(&self, diff: &str) -> Result<String, AiError>;
}

/// Summarizer backed by the Gemini `generateContent` endpoint
#[derive(Debug, Clone)]
pub struct GeminiSummarizer {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    max_diff_chars: usize,
}

impl GeminiSummarizer {
    /// Create a summarizer for `model`
    ///
    /// # Errors
    ///
    /// Returns `AiError::NotConfigured` if the API key or model is empty, or
    /// an HTTP error if the client cannot be built.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, AiError> {
        let api_key = api_key.into();
        let model = model.into();
        if api_key.trim().is_empty() {
            return Err(AiError::NotConfigured {
                message: "Gemini API key is empty".to_string(),
            });
        }
        if model.trim().is_empty() {
            return Err(AiError::NotConfigured {
                message: "Gemini model name is empty".to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            api_key,
            model,
            max_diff_chars: DEFAULT_MAX_DIFF_CHARS,
        })
    }

    /// Point the summarizer at a different API base
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Limit how much of each diff is sent to the model
    #[must_use]
    pub fn with_max_diff_chars(mut self, max_diff_chars: usize) -> Self {
        self.max_diff_chars = max_diff_chars;
        self
    }

    /// The model in use
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize_diff(&self, diff: &str) -> Result<String, AiError> {
        if diff.trim().is_empty() {
            return Ok(String::new());
        }

        let prompt = build_prompt(diff, self.max_diff_chars);
        let request = GenerateContentRequest::from_prompt(prompt);

        debug!(model = %self.model, diff_len = diff.len(), "Requesting diff summary");

        let response = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        if !status.is_success() {
            return Err(AiError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        Ok(parsed.first_text())
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

impl GenerateContentRequest {
    fn from_prompt(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, trimmed
    fn first_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}
