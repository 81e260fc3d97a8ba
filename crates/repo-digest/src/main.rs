// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! repo-digest: AI commit digests for linked GitHub repositories
//!
//! This binary serves the JSON API, and offers one-shot subcommands for
//! creating projects, listing data and polling from the command line.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use digest_ai::GeminiSummarizer;
use digest_github::GitHubClient;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use repo_digest::config::{Command, Config};
use repo_digest::db::Database;
use repo_digest::handlers;
use repo_digest::poller::Poller;
use repo_digest::queries;
use repo_digest::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs go to stderr; stdout carries command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .init();

    config.validate()?;

    let db_path = config.database_path();
    let db = Database::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    if !config.skip_init {
        db.initialize().context("failed to initialize database")?;
    }

    match config.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, db).await,
        Command::Projects { user } => {
            print_json(&queries::list_projects_for_user(db.connection(), &user)?)
        }
        Command::Commits { project } => {
            print_json(&queries::list_commits(db.connection(), &project)?)
        }
        Command::Create {
            user,
            name,
            url,
            token,
        } => {
            let state = app_state(&config, db)?;
            let args = json!({ "name": name, "githubUrl": url, "githubToken": token });
            let response =
                handlers::handle_create_project(&state.db, &state.poller, &user, args).await?;
            print_json(&response)
        }
        Command::Poll { project } => {
            let state = app_state(&config, db)?;
            match project {
                Some(id) => print_json(&state.poller.poll_commits(&state.db, &id).await?),
                None => print_json(&state.poller.poll_all(&state.db).await?),
            }
        }
    }
}

fn app_state(config: &Config, db: Database) -> anyhow::Result<AppState> {
    let source = GitHubClient::new(config.github_token.clone())?;
    let summarizer = GeminiSummarizer::new(config.gemini_api_key()?, config.gemini_model())?
        .with_max_diff_chars(config.max_diff_chars());
    let poller = Poller::new(Arc::new(source), Arc::new(summarizer))
        .with_commit_limit(config.commit_limit());
    Ok(AppState::new(db, poller))
}

async fn serve(config: &Config, db: Database) -> anyhow::Result<()> {
    let state = Arc::new(app_state(config, db)?);

    if let Some(every) = config.poll_interval() {
        info!(interval_secs = every.as_secs(), "Background polling enabled");
        server::spawn_periodic_poller(Arc::clone(&state), every);
    }

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    server::run(listener, state).await?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
