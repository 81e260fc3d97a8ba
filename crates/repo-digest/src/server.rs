//! HTTP server for repo-digest
//!
//! Exposes the project and commit operations as a JSON API over `axum`. The
//! caller is identified by the `x-user-id` header.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use digest_github::GitHubError;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::db::{CommitRecord, Database, ProjectRecord, SharedDatabase};
use crate::handlers::{self, CreateProjectResponse, DeleteProjectResponse, HandlerError};
use crate::poller::{PollError, PollStats, Poller};

/// Header carrying the caller's user id
pub const USER_HEADER: &str = "x-user-id";

/// State shared by every request
pub struct AppState {
    pub db: SharedDatabase,
    pub poller: Arc<Poller>,
}

impl AppState {
    #[must_use]
    pub fn new(db: Database, poller: Poller) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            poller: Arc::new(poller),
        }
    }
}

/// Build the axum router with all routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/projects", get(get_projects).post(create_project))
        .route("/projects/{id}", delete(delete_project))
        .route("/projects/{id}/commits", get(get_commits))
        .route("/projects/{id}/poll", post(poll_project))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Error mapping
// ============================================================================

/// Error response body
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn status_for(err: &HandlerError) -> StatusCode {
    match err {
        HandlerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        HandlerError::NotFound(_) => StatusCode::NOT_FOUND,
        HandlerError::Poll(PollError::InProgress { .. }) => StatusCode::CONFLICT,
        HandlerError::Poll(PollError::NoGithubUrl { .. }) => StatusCode::NOT_FOUND,
        HandlerError::Poll(PollError::GitHub(GitHubError::InvalidUrl { .. })) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

fn caller_id(headers: &HeaderMap) -> Result<String, HandlerError> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| HandlerError::InvalidInput(format!("missing {USER_HEADER} header")))
}

// ============================================================================
// Routes
// ============================================================================

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn get_projects(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ProjectRecord>>, HandlerError> {
    let user_id = caller_id(&headers)?;
    let projects = handlers::handle_get_projects(&state.db, &user_id).await?;
    Ok(Json(projects))
}

async fn create_project(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<CreateProjectResponse>), HandlerError> {
    let user_id = caller_id(&headers)?;
    let args: Value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|e| HandlerError::InvalidInput(e.to_string()))?
    };
    let response =
        handlers::handle_create_project(&state.db, &state.poller, &user_id, args).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn delete_project(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DeleteProjectResponse>, HandlerError> {
    let user_id = caller_id(&headers)?;
    let response = handlers::handle_delete_project(&state.db, &user_id, &id).await?;
    Ok(Json(response))
}

async fn get_commits(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<CommitRecord>>, HandlerError> {
    let user_id = caller_id(&headers)?;
    let commits = handlers::handle_get_commits(&state.db, &state.poller, &user_id, &id).await?;
    Ok(Json(commits))
}

async fn poll_project(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<PollStats>, HandlerError> {
    let user_id = caller_id(&headers)?;
    let stats = handlers::handle_poll_project(&state.db, &state.poller, &user_id, &id).await?;
    Ok(Json(stats))
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Poll every active project on a fixed interval
///
/// The first round runs one full interval after startup.
pub fn spawn_periodic_poller(state: Arc<AppState>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = state.poller.poll_all(&state.db).await {
                error!(error = %e, "Periodic poll failed");
            }
        }
    })
}

/// Serve the API on `listener` until Ctrl-C
///
/// # Errors
///
/// Returns an error if the listener fails.
pub async fn run(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "repo-digest listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
