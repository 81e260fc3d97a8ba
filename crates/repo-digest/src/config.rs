//! Configuration for the repo-digest server
//!
//! This module provides configuration types and utilities for the service,
//! including database paths, the listen address, API credentials, polling
//! settings, and logging options.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::poller::DEFAULT_COMMIT_LIMIT;

/// Address the HTTP API listens on by default
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000);

/// Upper bound on the commit window; GitHub's first page holds 30 commits
pub const MAX_COMMIT_LIMIT: usize = 30;

/// repo-digest - AI summaries of the latest commits of your GitHub projects
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "repo-digest")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Subcommand to run (defaults to serving the HTTP API)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to SQLite database file
    ///
    /// If the file doesn't exist, it will be created and initialized.
    /// Defaults to the platform data directory, e.g. ~/.local/share/repo-digest/repo-digest.db.
    #[arg(short, long, env = "REPO_DIGEST_DATABASE")]
    pub database: Option<PathBuf>,

    /// Address for the HTTP API [default: 127.0.0.1:3000]
    #[arg(short, long, env = "REPO_DIGEST_BIND")]
    pub bind: Option<SocketAddr>,

    /// Default GitHub token, used for projects that don't carry their own
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Gemini API key for commit summaries
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model name [default: gemini-1.5-flash]
    #[arg(long, env = "GEMINI_MODEL")]
    pub gemini_model: Option<String>,

    /// Seconds between background polls of every project; 0 disables them
    #[arg(long, env = "REPO_DIGEST_POLL_INTERVAL")]
    pub poll_interval_secs: Option<u64>,

    /// Number of most recent commits considered per poll [default: 10]
    #[arg(long)]
    pub commit_limit: Option<usize>,

    /// Longest diff (in characters) sent for summarization [default: 20000]
    #[arg(long)]
    pub max_diff_chars: Option<usize>,

    /// Enable verbose logging (debug level)
    ///
    /// Logs are written to stderr so that command output on stdout stays
    /// machine-readable.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Skip database initialization/migration check
    ///
    /// Useful for testing or when connecting to an externally managed database.
    #[arg(long, default_value = "false")]
    pub skip_init: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the HTTP API (the default)
    Serve,

    /// Link a GitHub repository to a user and run its first poll
    ///
    /// Example:
    ///   repo-digest create --user alice --name rust --url https://github.com/rust-lang/rust
    Create {
        /// Owner of the new project
        #[arg(long)]
        user: String,

        /// Project name
        #[arg(long)]
        name: String,

        /// GitHub repository URL
        #[arg(long)]
        url: String,

        /// Token for a private repository
        #[arg(long)]
        token: Option<String>,
    },

    /// List a user's projects as JSON
    Projects {
        #[arg(long)]
        user: String,
    },

    /// List a project's stored commits as JSON
    Commits {
        #[arg(long)]
        project: String,
    },

    /// Poll one project, or every active project when none is given
    Poll {
        #[arg(long)]
        project: Option<String>,
    },
}

impl Config {
    /// Get the database path, using a default if not specified
    ///
    /// Default location is platform-specific:
    /// - macOS: ~/Library/Application Support/repo-digest/repo-digest.db
    /// - Linux: ~/.local/share/repo-digest/repo-digest.db
    /// - Windows: %LOCALAPPDATA%\repo-digest\repo-digest.db
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("repo-digest")
                .join("repo-digest.db")
        })
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind.unwrap_or(DEFAULT_BIND)
    }

    #[must_use]
    pub fn commit_limit(&self) -> usize {
        self.commit_limit.unwrap_or(DEFAULT_COMMIT_LIMIT)
    }

    #[must_use]
    pub fn max_diff_chars(&self) -> usize {
        self.max_diff_chars
            .unwrap_or(digest_ai::DEFAULT_MAX_DIFF_CHARS)
    }

    #[must_use]
    pub fn gemini_model(&self) -> &str {
        self.gemini_model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(digest_ai::gemini::DEFAULT_MODEL)
    }

    /// Interval of the background poller, `None` when disabled
    #[must_use]
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// The Gemini API key
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSetting`] if no key was given.
    pub fn gemini_api_key(&self) -> Result<&str, ConfigError> {
        self.gemini_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingSetting("GEMINI_API_KEY"))
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The commit limit is outside 1..=30
    /// - The diff limit is zero
    /// - The database parent directory cannot be created
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limit = self.commit_limit();
        if !(1..=MAX_COMMIT_LIMIT).contains(&limit) {
            return Err(ConfigError::InvalidValue {
                name: "commit-limit",
                message: format!("must be between 1 and {MAX_COMMIT_LIMIT}, got {limit}"),
            });
        }
        if self.max_diff_chars() == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max-diff-chars",
                message: "must be greater than 0".to_string(),
            });
        }

        // Validate database path is writable (check parent exists or can be created)
        let db_path = self.database_path();
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::DatabaseDirectoryCreateFailed(parent.to_path_buf(), e))?;
        }

        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to create database directory
    #[error("Failed to create database directory {0}: {1}")]
    DatabaseDirectoryCreateFailed(PathBuf, std::io::Error),

    /// A setting is out of range
    #[error("Invalid value for --{name}: {message}")]
    InvalidValue {
        name: &'static str,
        message: String,
    },

    /// A required setting was not provided
    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),
}
