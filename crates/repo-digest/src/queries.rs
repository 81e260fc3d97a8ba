//! Query helper functions for the repo-digest database
//!
//! Read-side helpers over a borrowed [`Connection`]. Writes live on
//! [`Database`](crate::db::Database).

use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use crate::db::{CommitRecord, ProjectRecord};

/// Query errors
#[derive(Debug, Error)]
pub enum QueryError {
    /// SQLite error during query
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

const PROJECT_COLUMNS: &str =
    "p.id, p.name, p.github_url, p.github_token, p.created_at, p.updated_at, p.deleted_at";

/// Fetch a project by id, including soft-deleted projects
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_project(conn: &Connection, project_id: &str) -> Result<Option<ProjectRecord>, QueryError> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = ?1");
    let project = conn
        .query_row(&sql, params![project_id], ProjectRecord::from_row)
        .optional()?;
    Ok(project)
}

/// The GitHub URL and token of a project, if the project exists
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn project_github_url(
    conn: &Connection,
    project_id: &str,
) -> Result<Option<(String, Option<String>)>, QueryError> {
    let row = conn
        .query_row(
            "SELECT github_url, github_token FROM projects WHERE id = ?1",
            params![project_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(row)
}

/// Non-deleted projects linked to a user, most recently created first
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_projects_for_user(
    conn: &Connection,
    user_id: &str,
) -> Result<Vec<ProjectRecord>, QueryError> {
    let sql = format!(
        "SELECT {PROJECT_COLUMNS}
         FROM projects p
         JOIN user_projects up ON up.project_id = p.id
         WHERE up.user_id = ?1 AND p.deleted_at IS NULL
         ORDER BY p.created_at DESC, p.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let projects = stmt
        .query_map(params![user_id], ProjectRecord::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(projects)
}

/// Every non-deleted project, oldest first
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_active_projects(conn: &Connection) -> Result<Vec<ProjectRecord>, QueryError> {
    let sql = format!(
        "SELECT {PROJECT_COLUMNS} FROM projects p
         WHERE p.deleted_at IS NULL
         ORDER BY p.created_at, p.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let projects = stmt
        .query_map([], ProjectRecord::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(projects)
}

/// Whether `user_id` is linked to a non-deleted project `project_id`
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn user_has_project(
    conn: &Connection,
    user_id: &str,
    project_id: &str,
) -> Result<bool, QueryError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM user_projects up
         JOIN projects p ON p.id = up.project_id
         WHERE up.user_id = ?1 AND up.project_id = ?2 AND p.deleted_at IS NULL",
        params![user_id, project_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Stored commits of a project, newest commit date first
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_commits(conn: &Connection, project_id: &str) -> Result<Vec<CommitRecord>, QueryError> {
    let mut stmt = conn.prepare(
        "SELECT id, project_id, commit_hash, commit_message, commit_author_name,
                commit_author_avatar, commit_date, summary, created_at
         FROM commits
         WHERE project_id = ?1
         ORDER BY commit_date DESC, created_at DESC",
    )?;
    let commits = stmt
        .query_map(params![project_id], CommitRecord::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(commits)
}

/// Hashes of every commit already stored for a project
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn processed_commit_hashes(
    conn: &Connection,
    project_id: &str,
) -> Result<HashSet<String>, QueryError> {
    let mut stmt = conn.prepare("SELECT commit_hash FROM commits WHERE project_id = ?1")?;
    let hashes = stmt
        .query_map(params![project_id], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(hashes)
}
