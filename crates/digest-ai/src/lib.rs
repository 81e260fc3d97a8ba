// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! digest-ai: commit-diff summarization for repo-digest
//!
//! This library crate turns the unified diff of a commit into a short,
//! bullet-point summary using a hosted generative model.

#![warn(missing_docs)]

//! ## Provider
//!
//! The only provider is Google's Gemini `generateContent` REST endpoint,
//! reached through [`GeminiSummarizer`]. The pipeline depends on the
//! [`Summarizer`] trait, so other providers slot in without changes there.
//!
//! ```rust,no_run
//! use digest_ai::{GeminiSummarizer, Summarizer};
//!
//! # async fn run() -> Result<(), digest_ai::AiError> {
//! let summarizer = GeminiSummarizer::new("api-key", "gemini-1.5-flash")?;
//! let summary = summarizer.summarize_diff("diff --git a/x b/x\n+hello\n").await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod gemini;
pub mod prompt;

pub use error::AiError;
pub use gemini::{GeminiSummarizer, Summarizer};
pub use prompt::{DEFAULT_MAX_DIFF_CHARS, build_prompt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::AiError;
    pub use crate::gemini::{GeminiSummarizer, Summarizer};
}
