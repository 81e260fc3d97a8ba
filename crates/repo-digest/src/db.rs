//! Database module for repo-digest
//!
//! This module provides SQLite database operations for storing users, their
//! linked GitHub projects, and the summarized commits ingested for each project.

use std::sync::Arc;

use chrono::Utc;
use digest_github::CommitInfo;
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::migrations;

/// Database errors
#[derive(Debug, Error)]
pub enum DbError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] migrations::MigrationError),
}

/// Database handle shared between request handlers and the poller
pub type SharedDatabase = Arc<Mutex<Database>>;

/// Current time as an RFC 3339 string, the format every timestamp column uses
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

// ============================================================================
// Records
// ============================================================================

/// A project row: one linked GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub github_url: String,
    /// Per-project access token; never sent back to API clients
    #[serde(skip_serializing, default)]
    pub github_token: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

impl ProjectRecord {
    /// Create a new project record with a fresh id
    #[must_use]
    pub fn new(name: impl Into<String>, github_url: impl Into<String>) -> Self {
        let now = now_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            github_url: github_url.into(),
            github_token: None,
            created_at: now.clone(),
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Attach a per-project GitHub token; blank tokens are ignored
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.github_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Whether the project has been soft-deleted
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            github_url: row.get("github_url")?,
            github_token: row.get("github_token")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            deleted_at: row.get("deleted_at")?,
        })
    }
}

/// A commit row with its AI summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    pub id: String,
    pub project_id: String,
    pub commit_hash: String,
    pub commit_message: String,
    pub commit_author_name: String,
    pub commit_author_avatar: String,
    pub commit_date: String,
    /// Empty when the diff could not be downloaded or summarized
    pub summary: String,
    pub created_at: String,
}

impl CommitRecord {
    /// Build the row for a fetched commit and its summary
    #[must_use]
    pub fn from_commit(project_id: &str, commit: &CommitInfo, summary: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            commit_hash: commit.sha.clone(),
            commit_message: commit.message.clone(),
            commit_author_name: commit.author_name.clone(),
            commit_author_avatar: commit.author_avatar.clone(),
            commit_date: commit.date_string(),
            summary,
            created_at: now_timestamp(),
        }
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            project_id: row.get("project_id")?,
            commit_hash: row.get("commit_hash")?,
            commit_message: row.get("commit_message")?,
            commit_author_name: row.get("commit_author_name")?,
            commit_author_avatar: row.get("commit_author_avatar")?,
            commit_date: row.get("commit_date")?,
            summary: row.get("summary")?,
            created_at: row.get("created_at")?,
        })
    }
}

// ============================================================================
// Database
// ============================================================================

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new in-memory database
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::configure(conn)
    }

    /// Open a database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database file cannot be opened.
    pub fn open(path: &std::path::Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> Result<Self, DbError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// Initialize the database schema using migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn initialize(&self) -> Result<(), DbError> {
        migrations::migrate(&self.conn)?;
        Ok(())
    }

    /// Check if the database is initialized and up to date
    pub fn is_initialized(&self) -> bool {
        migrations::is_up_to_date(&self.conn)
    }

    /// Get the current schema version
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, DbError> {
        Ok(migrations::get_version(&self.conn)?)
    }

    /// Get the underlying connection (for read queries)
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Execute a simple query and return the count
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self, table: &str) -> Result<i64, DbError> {
        let query = format!("SELECT COUNT(*) FROM {table}");
        let count: i64 = self.conn.query_row(&query, [], |row| row.get(0))?;
        Ok(count)
    }

    /// Insert the user if it does not exist yet
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn ensure_user(&self, user_id: &str) -> Result<(), DbError> {
        ensure_user_on(&self.conn, user_id)
    }

    /// Create a project and link it to `user_id`, in one transaction
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is written in that case.
    pub fn create_project(&mut self, user_id: &str, project: &ProjectRecord) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        ensure_user_on(&tx, user_id)?;
        tx.execute(
            "INSERT INTO projects (id, name, github_url, github_token, created_at, updated_at, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                project.id,
                project.name,
                project.github_url,
                project.github_token,
                project.created_at,
                project.updated_at,
                project.deleted_at,
            ],
        )?;
        tx.execute(
            "INSERT INTO user_projects (user_id, project_id, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, project.id, project.created_at],
        )?;
        tx.commit()?;

        tracing::debug!(project_id = %project.id, user_id, "Created project");
        Ok(())
    }

    /// Mark a project as deleted
    ///
    /// Returns `false` when the project does not exist or was already deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn soft_delete_project(&self, project_id: &str) -> Result<bool, DbError> {
        let now = now_timestamp();
        let changed = self.conn.execute(
            "UPDATE projects SET deleted_at = ?1, updated_at = ?1
             WHERE id = ?2 AND deleted_at IS NULL",
            params![now, project_id],
        )?;
        Ok(changed > 0)
    }

    /// Insert summarized commits in a single transaction
    ///
    /// Rows whose `(project_id, commit_hash)` already exists are skipped.
    /// Returns the number of rows actually inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is written in that case.
    pub fn insert_commits_batch(&mut self, commits: &[CommitRecord]) -> Result<usize, DbError> {
        if commits.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO commits (
                    id, project_id, commit_hash, commit_message, commit_author_name,
                    commit_author_avatar, commit_date, summary, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for c in commits {
                inserted += stmt.execute(params![
                    c.id,
                    c.project_id,
                    c.commit_hash,
                    c.commit_message,
                    c.commit_author_name,
                    c.commit_author_avatar,
                    c.commit_date,
                    c.summary,
                    c.created_at,
                ])?;
            }
        }
        tx.commit()?;

        Ok(inserted)
    }
}

fn ensure_user_on(conn: &Connection, user_id: &str) -> Result<(), DbError> {
    conn.execute(
        "INSERT OR IGNORE INTO users (id, email, created_at) VALUES (?1, NULL, ?2)",
        params![user_id, now_timestamp()],
    )?;
    Ok(())
}
