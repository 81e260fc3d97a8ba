//! API operation handlers
//!
//! Each handler takes already-extracted request data (caller id, path
//! parameters, JSON body), runs against the shared database and poller, and
//! returns a serializable result. The HTTP layer in [`crate::server`] and the
//! CLI both call into these.

use std::sync::Arc;

use digest_github::RepoUrl;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::db::{CommitRecord, DbError, ProjectRecord, SharedDatabase};
use crate::poller::{PollError, PollStats, Poller};
use crate::queries::{self, QueryError};

// ============================================================================
// Error Types
// ============================================================================

/// Handler errors
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Query error
    #[error("Database query failed: {0}")]
    Query(#[from] QueryError),

    /// Database write error
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Polling error
    #[error("{0}")]
    Poll(#[from] PollError),

    /// Invalid input - missing or malformed field
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),
}

// ============================================================================
// Input Types
// ============================================================================

/// Input for creating a project
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectInput {
    /// Display name
    pub name: String,
    /// URL of the GitHub repository
    pub github_url: String,
    /// Optional token for private repositories
    #[serde(default)]
    pub github_token: Option<String>,
}

// ============================================================================
// Output Types
// ============================================================================

/// Response from creating a project
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectResponse {
    /// The stored project
    pub project: ProjectRecord,
    /// Result of the first poll; `null` if it failed
    pub poll: Option<PollStats>,
    /// Why the first poll failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_error: Option<String>,
}

/// Response from deleting a project
#[derive(Debug, Clone, Serialize)]
pub struct DeleteProjectResponse {
    /// The project that was targeted
    pub id: String,
    /// Whether this call performed the soft delete
    pub deleted: bool,
}

// ============================================================================
// Handler Functions
// ============================================================================

/// Parse a JSON body into a typed input; `null` is treated as `{}`
///
/// # Errors
///
/// Returns [`HandlerError::InvalidInput`] if the value does not match `T`.
pub fn parse_input<T: for<'de> Deserialize<'de>>(args: Value) -> Result<T, HandlerError> {
    let value = match args {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };
    serde_json::from_value(value).map_err(|e| HandlerError::InvalidInput(e.to_string()))
}

fn require_user(user_id: &str) -> Result<(), HandlerError> {
    if user_id.trim().is_empty() {
        return Err(HandlerError::InvalidInput("user id is required".to_string()));
    }
    Ok(())
}

/// Fail with `NotFound` unless the project is live and linked to the user
async fn require_project(
    db: &SharedDatabase,
    user_id: &str,
    project_id: &str,
) -> Result<(), HandlerError> {
    require_user(user_id)?;
    let db = db.lock().await;
    if queries::user_has_project(db.connection(), user_id, project_id)? {
        Ok(())
    } else {
        Err(HandlerError::NotFound(format!(
            "Project not found: {project_id}"
        )))
    }
}

/// Handle project creation
///
/// Stores the project for the user, then runs the first poll. A failed poll
/// leaves the project in place and is reported in the response.
pub async fn handle_create_project(
    db: &SharedDatabase,
    poller: &Poller,
    user_id: &str,
    args: Value,
) -> Result<CreateProjectResponse, HandlerError> {
    require_user(user_id)?;
    let input: CreateProjectInput = parse_input(args)?;

    let name = input.name.trim();
    if name.is_empty() {
        return Err(HandlerError::InvalidInput(
            "Project name cannot be empty".to_string(),
        ));
    }
    let github_url = input.github_url.trim();
    if github_url.is_empty() {
        return Err(HandlerError::InvalidInput(
            "Github url cannot be empty".to_string(),
        ));
    }
    RepoUrl::parse(github_url).map_err(|e| HandlerError::InvalidInput(e.to_string()))?;

    let project = ProjectRecord::new(name, github_url).with_token(input.github_token);
    db.lock().await.create_project(user_id, &project)?;

    let (poll, poll_error) = match poller.poll_commits(db, &project.id).await {
        Ok(stats) => (Some(stats), None),
        Err(e) => {
            warn!(project_id = %project.id, error = %e, "Initial poll failed");
            (None, Some(e.to_string()))
        }
    };

    Ok(CreateProjectResponse {
        project,
        poll,
        poll_error,
    })
}

/// Handle listing the caller's projects
pub async fn handle_get_projects(
    db: &SharedDatabase,
    user_id: &str,
) -> Result<Vec<ProjectRecord>, HandlerError> {
    require_user(user_id)?;
    let db = db.lock().await;
    Ok(queries::list_projects_for_user(db.connection(), user_id)?)
}

/// Handle listing a project's commits
///
/// Kicks off a background poll without waiting for it and returns what is
/// stored right now. Background failures are only logged.
pub async fn handle_get_commits(
    db: &SharedDatabase,
    poller: &Arc<Poller>,
    user_id: &str,
    project_id: &str,
) -> Result<Vec<CommitRecord>, HandlerError> {
    require_project(db, user_id, project_id).await?;

    let bg_db = Arc::clone(db);
    let bg_poller = Arc::clone(poller);
    let bg_project = project_id.to_string();
    tokio::spawn(async move {
        match bg_poller.poll_commits(&bg_db, &bg_project).await {
            Ok(stats) => debug!(project_id = %bg_project, inserted = stats.inserted, "Background poll done"),
            Err(PollError::InProgress { .. }) => {
                debug!(project_id = %bg_project, "Background poll skipped, already running");
            }
            Err(e) => error!(project_id = %bg_project, error = %e, "Background poll failed"),
        }
    });

    let db = db.lock().await;
    Ok(queries::list_commits(db.connection(), project_id)?)
}

/// Handle an explicit poll of one project
pub async fn handle_poll_project(
    db: &SharedDatabase,
    poller: &Poller,
    user_id: &str,
    project_id: &str,
) -> Result<PollStats, HandlerError> {
    require_project(db, user_id, project_id).await?;
    Ok(poller.poll_commits(db, project_id).await?)
}

/// Handle soft-deleting a project
pub async fn handle_delete_project(
    db: &SharedDatabase,
    user_id: &str,
    project_id: &str,
) -> Result<DeleteProjectResponse, HandlerError> {
    require_project(db, user_id, project_id).await?;
    let deleted = db.lock().await.soft_delete_project(project_id)?;
    Ok(DeleteProjectResponse {
        id: project_id.to_string(),
        deleted,
    })
}
