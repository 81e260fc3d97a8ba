// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! digest-github: GitHub commit retrieval for repo-digest
//!
//! This library crate lists the recent commits of a GitHub repository through
//! the REST API and downloads per-commit diffs for summarization.

#![warn(missing_docs)]

//! # Example
//!
//! ```no_run
//! use digest_github::{CommitSource, GitHubClient, RepoUrl};
//!
//! # async fn run() -> Result<(), digest_github::GitHubError> {
//! let client = GitHubClient::new(None)?;
//! let repo = RepoUrl::parse("https://github.com/rust-lang/rust")?;
//! for c in client.recent_commits(&repo, None, 10).await? {
//!     println!("{} - {}", c.short_sha(), c.subject());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod commit;
pub mod error;
pub mod url;

pub use client::{CommitSource, GitHubClient};
pub use commit::{CommitInfo, sort_newest_first};
pub use error::GitHubError;
pub use url::RepoUrl;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::{CommitSource, GitHubClient};
    pub use crate::commit::CommitInfo;
    pub use crate::error::GitHubError;
    pub use crate::url::RepoUrl;
}
