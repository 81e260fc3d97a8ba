// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! GitHub REST client
//!
//! [`CommitSource`] is the seam the polling pipeline depends on;
//! [`GitHubClient`] is the `reqwest` implementation used in production.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use reqwest::header::ACCEPT;
use tracing::debug;

use crate::commit::{CommitInfo, parse_commit_list, sort_newest_first};
use crate::error::GitHubError;
use crate::url::RepoUrl;

/// Default GitHub REST API base URL
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("repo-digest/", env!("CARGO_PKG_VERSION"));
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of commit listings and diffs for a repository
#[async_trait]
pub trait CommitSource: Send + Sync {
    /// List the `limit` most recent commits of a repository, newest first
    ///
    /// `token` overrides any token the source was configured with.
    async fn recent_commits(
        &self,
        repo: &RepoUrl,
        token: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CommitInfo>, GitHubError>;

    /// Download the unified diff of a single commit
    async fn commit_diff(
        &self,
        repo: &RepoUrl,
        sha: &str,
        token: Option<&str>,
    ) -> Result<String, GitHubError>;
}

/// `reqwest`-backed GitHub client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Create a client against the public GitHub API
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(token: Option<String>) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Point the client at a different API base (GitHub Enterprise, tests)
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// The API base URL in use
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn effective_token<'a>(&'a self, token: Option<&'a str>) -> Option<&'a str> {
        token
            .filter(|t| !t.is_empty())
            .or(self.token.as_deref())
    }

    fn authorize(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match self.effective_token(token) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_text(&self, request: RequestBuilder, url: String) -> Result<String, GitHubError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GitHubError::Status {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl CommitSource for GitHubClient {
    async fn recent_commits(
        &self,
        repo: &RepoUrl,
        token: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CommitInfo>, GitHubError> {
        let url = format!("{}/repos/{}/{}/commits", self.api_base, repo.owner, repo.repo);
        debug!(%url, "Listing commits");

        let request = self.authorize(self.http.get(&url).header(ACCEPT, JSON_MEDIA_TYPE), token);
        let body = self.get_text(request, url.clone()).await?;

        let mut commits = parse_commit_list(&body).map_err(|e| GitHubError::Decode {
            url,
            message: e.to_string(),
        })?;
        sort_newest_first(&mut commits);
        commits.truncate(limit);

        debug!(repo = %repo.full_name(), count = commits.len(), "Listed commits");
        Ok(commits)
    }

    async fn commit_diff(
        &self,
        repo: &RepoUrl,
        sha: &str,
        token: Option<&str>,
    ) -> Result<String, GitHubError> {
        // The web diff endpoint only serves public repositories; with a token
        // the API endpoint is used so private repositories work too.
        let url = match self.effective_token(token) {
            Some(_) => format!(
                "{}/repos/{}/{}/commits/{}",
                self.api_base, repo.owner, repo.repo, sha
            ),
            None => repo.diff_url(sha),
        };
        debug!(%url, "Fetching commit diff");

        let request = self.authorize(self.http.get(&url).header(ACCEPT, DIFF_MEDIA_TYPE), token);
        self.get_text(request, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults_to_public_api() {
        let client = GitHubClient::new(None).expect("client");
        assert_eq!(client.api_base(), DEFAULT_API_BASE);
        assert!(client.token.is_none());
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let client = GitHubClient::new(Some(String::new())).expect("client");
        assert!(client.token.is_none());
    }

    #[test]
    fn test_with_api_base_trims_slash() {
        let client = GitHubClient::new(None)
            .expect("client")
            .with_api_base("http://localhost:8080/");
        assert_eq!(client.api_base(), "http://localhost:8080");
    }

    #[test]
    fn test_call_token_overrides_default() {
        let client = GitHubClient::new(Some("default".to_string())).expect("client");
        assert_eq!(client.effective_token(Some("override")), Some("override"));
        assert_eq!(client.effective_token(Some("")), Some("default"));
        assert_eq!(client.effective_token(None), Some("default"));
    }
}
