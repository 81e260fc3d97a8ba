// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Commit polling pipeline
//!
//! One poll of a project runs four steps: look up its GitHub URL, list the
//! most recent commits, drop the ones already stored, then summarize the rest
//! concurrently and insert them in a single batch.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use digest_ai::GeminiSummarizer;
//! use digest_github::GitHubClient;
//! use repo_digest::db::Database;
//! use repo_digest::poller::Poller;
//! use tokio::sync::Mutex;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::in_memory()?;
//! db.initialize()?;
//! let db = Mutex::new(db);
//!
//! let poller = Poller::new(
//!     Arc::new(GitHubClient::new(None)?),
//!     Arc::new(GeminiSummarizer::new("key", "gemini-1.5-flash")?),
//! );
//! let stats = poller.poll_commits(&db, "project-id").await?;
//! println!("Inserted {} commits", stats.inserted);
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::sync::{Arc, PoisonError};

use digest_ai::{AiError, Summarizer};
use digest_github::{CommitInfo, CommitSource, GitHubError, RepoUrl};
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::db::{CommitRecord, Database, DbError};
use crate::queries::{self, QueryError};

/// Number of most recent commits considered on each poll
pub const DEFAULT_COMMIT_LIMIT: usize = 10;

// ============================================================================
// Error Types
// ============================================================================

/// Polling errors
#[derive(Debug, Error)]
pub enum PollError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Query error
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// GitHub error
    #[error("GitHub error: {0}")]
    GitHub(#[from] GitHubError),

    /// The project does not exist or has no URL stored
    #[error("Project has no github url")]
    NoGithubUrl {
        /// The project that was looked up
        project_id: String,
    },

    /// Another poll of the same project is still running
    #[error("A poll of project {project_id} is already in progress")]
    InProgress {
        /// The project being polled
        project_id: String,
    },
}

/// Why a single commit ended up without a summary
#[derive(Debug, Error)]
pub enum SummaryError {
    /// The diff could not be downloaded
    #[error("Diff download failed: {0}")]
    Diff(#[from] GitHubError),

    /// The AI service failed
    #[error("Summarization failed: {0}")]
    Ai(#[from] AiError),
}

// ============================================================================
// Statistics
// ============================================================================

/// Statistics from polling one project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollStats {
    /// Commits returned by GitHub (after the commit window)
    pub fetched: usize,
    /// Commits already stored for the project
    pub skipped: usize,
    /// Rows actually inserted
    pub inserted: usize,
    /// Commits stored with an empty summary
    pub summary_failures: usize,
}

impl PollStats {
    /// Merge stats from another poll
    pub fn merge(&mut self, other: &PollStats) {
        self.fetched += other.fetched;
        self.skipped += other.skipped;
        self.inserted += other.inserted;
        self.summary_failures += other.summary_failures;
    }
}

/// Statistics from polling every active project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollRoundStats {
    /// Projects polled successfully
    pub projects_polled: usize,
    /// Projects whose poll failed
    pub projects_failed: usize,
    /// Projects skipped because a poll was already running
    pub projects_skipped: usize,
    /// Summed stats of the successful polls
    pub totals: PollStats,
}

// ============================================================================
// Pipeline steps
// ============================================================================

/// Where a project's commits come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSource {
    /// Repository URL as stored on the project
    pub github_url: String,
    /// Per-project token, if one was given
    pub github_token: Option<String>,
}

/// Look up the GitHub URL (and token) stored for a project
///
/// # Errors
///
/// Returns [`PollError::NoGithubUrl`] if the project is missing or its URL is empty.
pub fn fetch_project_github_url(db: &Database, project_id: &str) -> Result<ProjectSource, PollError> {
    match queries::project_github_url(db.connection(), project_id)? {
        Some((github_url, github_token)) if !github_url.trim().is_empty() => Ok(ProjectSource {
            github_url,
            github_token,
        }),
        _ => Err(PollError::NoGithubUrl {
            project_id: project_id.to_string(),
        }),
    }
}

/// List the `limit` most recent commits of a repository, newest first
///
/// # Errors
///
/// Returns an error if GitHub cannot be reached or answers with a failure status.
pub async fn get_commit_hashes(
    source: &dyn CommitSource,
    repo: &RepoUrl,
    token: Option<&str>,
    limit: usize,
) -> Result<Vec<CommitInfo>, PollError> {
    Ok(source.recent_commits(repo, token, limit).await?)
}

/// Keep the commits whose hash is not in `processed`, preserving order
#[must_use]
pub fn filter_unprocessed_commits(
    processed: &HashSet<String>,
    commits: Vec<CommitInfo>,
) -> Vec<CommitInfo> {
    commits
        .into_iter()
        .filter(|c| !processed.contains(&c.sha))
        .collect()
}

/// Download one commit's diff and summarize it
///
/// # Errors
///
/// Returns an error if either the download or the summarization fails.
pub async fn summarise_commit(
    source: &dyn CommitSource,
    summarizer: &dyn Summarizer,
    repo: &RepoUrl,
    token: Option<&str>,
    commit: &CommitInfo,
) -> Result<String, SummaryError> {
    let diff = source.commit_diff(repo, &commit.sha, token).await?;
    Ok(summarizer.summarize_diff(&diff).await?)
}

/// Summaries for a batch of commits, index-aligned with the input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryBatch {
    /// One summary per commit; `""` where summarizing failed
    pub summaries: Vec<String>,
    /// How many commits fell back to an empty summary
    pub failures: usize,
}

/// Summarize every commit concurrently
///
/// A failure never aborts the batch: it is logged and that commit's summary is
/// the empty string.
pub async fn summarise_commits(
    source: &dyn CommitSource,
    summarizer: &dyn Summarizer,
    repo: &RepoUrl,
    token: Option<&str>,
    commits: &[CommitInfo],
) -> SummaryBatch {
    let results = join_all(
        commits
            .iter()
            .map(|commit| summarise_commit(source, summarizer, repo, token, commit)),
    )
    .await;

    let mut batch = SummaryBatch::default();
    for (commit, result) in commits.iter().zip(results) {
        match result {
            Ok(summary) => batch.summaries.push(summary),
            Err(e) => {
                warn!(sha = %commit.sha, error = %e, "Failed to summarize commit");
                batch.failures += 1;
                batch.summaries.push(String::new());
            }
        }
    }
    batch
}

// ============================================================================
// Poller
// ============================================================================

/// Runs the polling pipeline against a shared database
pub struct Poller {
    source: Arc<dyn CommitSource>,
    summarizer: Arc<dyn Summarizer>,
    commit_limit: usize,
    in_flight: std::sync::Mutex<HashSet<String>>,
}

/// Marks a project as being polled until dropped
struct InFlight<'a> {
    set: &'a std::sync::Mutex<HashSet<String>>,
    project_id: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.project_id);
    }
}

impl Poller {
    /// Create a poller with the default commit window
    #[must_use]
    pub fn new(source: Arc<dyn CommitSource>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            source,
            summarizer,
            commit_limit: DEFAULT_COMMIT_LIMIT,
            in_flight: std::sync::Mutex::new(HashSet::new()),
        }
    }

    /// Set how many recent commits each poll considers
    #[must_use]
    pub fn with_commit_limit(mut self, limit: usize) -> Self {
        self.commit_limit = limit.max(1);
        self
    }

    /// The commit window in use
    #[must_use]
    pub fn commit_limit(&self) -> usize {
        self.commit_limit
    }

    fn begin(&self, project_id: &str) -> Result<InFlight<'_>, PollError> {
        let mut set = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !set.insert(project_id.to_string()) {
            return Err(PollError::InProgress {
                project_id: project_id.to_string(),
            });
        }
        Ok(InFlight {
            set: &self.in_flight,
            project_id: project_id.to_string(),
        })
    }

    /// Poll one project: fetch, filter, summarize and insert its new commits
    ///
    /// The database lock is never held while GitHub or the AI service is
    /// being called.
    ///
    /// # Errors
    ///
    /// Returns an error if the project has no URL, GitHub fails, the database
    /// fails, or a poll of the same project is already running. Summary
    /// failures are not errors.
    pub async fn poll_commits(
        &self,
        db: &Mutex<Database>,
        project_id: &str,
    ) -> Result<PollStats, PollError> {
        let _in_flight = self.begin(project_id)?;

        let project = {
            let db = db.lock().await;
            fetch_project_github_url(&db, project_id)?
        };
        let token = project.github_token.as_deref();
        let repo = RepoUrl::parse(&project.github_url)?;

        debug!(project_id, repo = %repo.full_name(), "Polling project");
        let commits =
            get_commit_hashes(self.source.as_ref(), &repo, token, self.commit_limit).await?;
        let fetched = commits.len();

        let processed = {
            let db = db.lock().await;
            queries::processed_commit_hashes(db.connection(), project_id)?
        };
        let fresh = filter_unprocessed_commits(&processed, commits);

        let mut stats = PollStats {
            fetched,
            skipped: fetched - fresh.len(),
            ..PollStats::default()
        };
        if fresh.is_empty() {
            debug!(project_id, fetched, "No new commits");
            return Ok(stats);
        }

        let batch = summarise_commits(
            self.source.as_ref(),
            self.summarizer.as_ref(),
            &repo,
            token,
            &fresh,
        )
        .await;
        stats.summary_failures = batch.failures;

        let records: Vec<CommitRecord> = fresh
            .iter()
            .zip(batch.summaries)
            .map(|(commit, summary)| CommitRecord::from_commit(project_id, commit, summary))
            .collect();

        stats.inserted = {
            let mut db = db.lock().await;
            db.insert_commits_batch(&records)?
        };

        info!(
            project_id,
            fetched = stats.fetched,
            skipped = stats.skipped,
            inserted = stats.inserted,
            summary_failures = stats.summary_failures,
            "Poll complete"
        );
        Ok(stats)
    }

    /// Poll every active project in turn
    ///
    /// A failing project is logged and counted; the round carries on.
    ///
    /// # Errors
    ///
    /// Returns an error only if the project list cannot be read.
    pub async fn poll_all(&self, db: &Mutex<Database>) -> Result<PollRoundStats, PollError> {
        let projects = {
            let db = db.lock().await;
            queries::list_active_projects(db.connection())?
        };

        let mut round = PollRoundStats::default();
        for project in &projects {
            match self.poll_commits(db, &project.id).await {
                Ok(stats) => {
                    round.projects_polled += 1;
                    round.totals.merge(&stats);
                }
                Err(PollError::InProgress { .. }) => {
                    debug!(project_id = %project.id, "Poll already running, skipping");
                    round.projects_skipped += 1;
                }
                Err(e) => {
                    error!(project_id = %project.id, error = %e, "Poll failed");
                    round.projects_failed += 1;
                }
            }
        }

        info!(
            polled = round.projects_polled,
            failed = round.projects_failed,
            skipped = round.projects_skipped,
            inserted = round.totals.inserted,
            "Poll round complete"
        );
        Ok(round)
    }
}
