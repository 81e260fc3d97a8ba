// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Repository URL handling
//!
//! A linked repository is identified by the last two path segments of its
//! web URL (`https://github.com/<owner>/<repo>`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GitHubError;

/// A GitHub repository reference parsed from its web URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoUrl {
    /// Repository owner (user or organisation)
    pub owner: String,
    /// Repository name
    pub repo: String,
    web_url: String,
}

impl RepoUrl {
    /// Parse a repository URL
    ///
    /// Trailing slashes and a trailing `.git` are ignored.
    ///
    /// # Errors
    ///
    /// Returns `GitHubError::InvalidUrl` if the URL does not end in two
    /// non-empty path segments.
    pub fn parse(url: &str) -> Result<Self, GitHubError> {
        let invalid = || GitHubError::InvalidUrl {
            url: url.to_string(),
        };

        let trimmed = url.trim().trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

        let mut segments = trimmed.rsplit('/');
        let repo = segments.next().ok_or_else(invalid)?;
        let owner = segments.next().ok_or_else(invalid)?;

        if owner.is_empty() || repo.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            web_url: trimmed.to_string(),
        })
    }

    /// The normalized web URL of the repository
    #[must_use]
    pub fn web_url(&self) -> &str {
        &self.web_url
    }

    /// `owner/repo`
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// URL of the plain-text diff for a commit
    #[must_use]
    pub fn diff_url(&self, sha: &str) -> String {
        format!("{}/commit/{}.diff", self.web_url, sha)
    }
}

impl fmt::Display for RepoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.web_url)
    }
}
