//! Commit types and GitHub response mapping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A commit as listed by the GitHub REST API, reduced to what gets stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// The commit SHA (40 hex characters)
    pub sha: String,
    /// Full commit message
    pub message: String,
    /// Git author name
    pub author_name: String,
    /// Avatar URL of the linked GitHub account, empty if the author has none
    pub author_avatar: String,
    /// Author date
    pub date: Option<DateTime<Utc>>,
}

impl CommitInfo {
    /// Validate that a SHA is a valid 40-character hex string
    #[must_use]
    pub fn is_valid_sha(sha: &str) -> bool {
        sha.len() == 40 && sha.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Get the short SHA (first 7 characters)
    #[must_use]
    pub fn short_sha(&self) -> &str {
        let end = self
            .sha
            .char_indices()
            .nth(7)
            .map_or(self.sha.len(), |(idx, _)| idx);
        &self.sha[..end]
    }

    /// Get the first line of the commit message (subject)
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// RFC 3339 author date, or an empty string when unknown
    #[must_use]
    pub fn date_string(&self) -> String {
        self.date.map(|d| d.to_rfc3339()).unwrap_or_default()
    }
}

/// Sort commits newest first by author date
///
/// Commits without a date sort last and keep their relative order.
pub fn sort_newest_first(commits: &mut [CommitInfo]) {
    commits.sort_by(|a, b| match (a.date, b.date) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

// ============================================================================
// GitHub wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiCommit {
    sha: String,
    #[serde(default)]
    commit: Option<ApiCommitDetail>,
    #[serde(default)]
    author: Option<ApiUser>,
}

#[derive(Debug, Deserialize)]
struct ApiCommitDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    author: Option<ApiSignature>,
}

#[derive(Debug, Deserialize)]
struct ApiSignature {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    #[serde(default)]
    avatar_url: Option<String>,
}

impl From<ApiCommit> for CommitInfo {
    fn from(api: ApiCommit) -> Self {
        let (message, signature) = match api.commit {
            Some(detail) => (detail.message.unwrap_or_default(), detail.author),
            None => (String::new(), None),
        };
        let (author_name, date) = match signature {
            Some(sig) => (
                sig.name.unwrap_or_default(),
                sig.date
                    .as_deref()
                    .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
                    .map(|d| d.with_timezone(&Utc)),
            ),
            None => (String::new(), None),
        };

        Self {
            sha: api.sha,
            message,
            author_name,
            author_avatar: api.author.and_then(|u| u.avatar_url).unwrap_or_default(),
            date,
        }
    }
}

/// Parse the JSON body of `GET /repos/{owner}/{repo}/commits`
///
/// # Errors
///
/// Returns an error if the body is not a JSON array of commit objects.
pub fn parse_commit_list(body: &str) -> Result<Vec<CommitInfo>, serde_json::Error> {
    let commits: Vec<ApiCommit> = serde_json::from_str(body)?;
    Ok(commits.into_iter().map(CommitInfo::from).collect())
}
