// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! CLI tests for flag parsing, environment fallbacks and validation
//!
//! Environment-driven tests each own a distinct variable so they do not race
//! with flag-only tests running in parallel.


use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use repo_digest::config::{Command, Config, ConfigError};
use similar_asserts::assert_eq;
use test_utils::{EnvGuard, TempTestDir};

// ============================================================================
// Flag parsing
// ============================================================================

#[test]
fn test_database_short_flag_d() {
    let config = Config::try_parse_from(["repo-digest", "-d", "/custom/path/db.sqlite"])
        .expect("parse should succeed");
    assert_eq!(config.database_path(), PathBuf::from("/custom/path/db.sqlite"));
}

#[test]
fn test_database_flag_missing_value_fails() {
    let result = Config::try_parse_from(["repo-digest", "--database"]);
    assert!(result.is_err());
}

#[test]
fn test_bind_flag() {
    let config = Config::try_parse_from(["repo-digest", "--bind", "0.0.0.0:8080"])
        .expect("parse should succeed");
    let expected: SocketAddr = "0.0.0.0:8080".parse().expect("addr");
    assert_eq!(config.bind_addr(), expected);
}

#[test]
fn test_bind_flag_rejects_garbage() {
    let result = Config::try_parse_from(["repo-digest", "--bind", "localhost"]);
    assert!(result.is_err(), "a bare host name is not a socket address");
}

#[test]
fn test_polling_flags() {
    let config = Config::try_parse_from([
        "repo-digest",
        "--commit-limit",
        "5",
        "--max-diff-chars",
        "1000",
    ])
    .expect("parse should succeed");
    assert_eq!(config.commit_limit(), 5);
    assert_eq!(config.max_diff_chars(), 1000);
}

#[test]
fn test_verbose_and_quiet_flags() {
    let config = Config::try_parse_from(["repo-digest", "-v"]).expect("parse");
    assert_eq!(config.log_level(), tracing::Level::DEBUG);

    let config = Config::try_parse_from(["repo-digest", "--quiet"]).expect("parse");
    assert_eq!(config.log_level(), tracing::Level::WARN);
}

#[test]
fn test_skip_init_flag() {
    let config = Config::try_parse_from(["repo-digest", "--skip-init"]).expect("parse");
    assert!(config.skip_init);
}

// ============================================================================
// Subcommands
// ============================================================================

#[test]
fn test_no_subcommand_means_serve() {
    let config = Config::try_parse_from(["repo-digest"]).expect("parse");
    assert!(config.command.is_none());

    let config = Config::try_parse_from(["repo-digest", "serve"]).expect("parse");
    assert_eq!(config.command, Some(Command::Serve));
}

#[test]
fn test_projects_and_commits_subcommands() {
    let config =
        Config::try_parse_from(["repo-digest", "projects", "--user", "alice"]).expect("parse");
    assert_eq!(
        config.command,
        Some(Command::Projects {
            user: "alice".to_string()
        })
    );

    let config =
        Config::try_parse_from(["repo-digest", "commits", "--project", "p1"]).expect("parse");
    assert_eq!(
        config.command,
        Some(Command::Commits {
            project: "p1".to_string()
        })
    );
}

#[test]
fn test_create_requires_url() {
    let result = Config::try_parse_from(["repo-digest", "create", "--user", "a", "--name", "n"]);
    assert!(result.is_err());
}

#[test]
fn test_poll_single_project() {
    let config =
        Config::try_parse_from(["repo-digest", "poll", "--project", "p1"]).expect("parse");
    assert_eq!(
        config.command,
        Some(Command::Poll {
            project: Some("p1".to_string())
        })
    );
}

// ============================================================================
// Environment fallbacks
// ============================================================================

#[test]
fn test_poll_interval_from_env() {
    let _guard = EnvGuard::set("REPO_DIGEST_POLL_INTERVAL", "300");
    let config = Config::try_parse_from(["repo-digest"]).expect("parse");
    assert_eq!(config.poll_interval(), Some(Duration::from_secs(300)));
}

#[test]
fn test_gemini_model_from_env() {
    let _guard = EnvGuard::set("GEMINI_MODEL", "gemini-2.0-flash");
    let config = Config::try_parse_from(["repo-digest"]).expect("parse");
    assert_eq!(config.gemini_model(), "gemini-2.0-flash");
}

#[test]
fn test_gemini_key_flag_beats_env() {
    let _guard = EnvGuard::set("GEMINI_API_KEY", "from-env");
    let config =
        Config::try_parse_from(["repo-digest", "--gemini-api-key", "from-flag"]).expect("parse");
    assert_eq!(config.gemini_api_key().expect("key"), "from-flag");
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_validate_creates_nested_database_directory() {
    let temp = TempTestDir::new("validate_nested");
    let db_path = temp.path().join("a").join("b").join("repo-digest.db");
    let config = Config {
        database: Some(db_path.clone()),
        ..Default::default()
    };

    config.validate().expect("validate");
    assert!(db_path.parent().expect("parent").is_dir());
}

#[test]
fn test_validate_rejects_large_commit_limit() {
    let temp = TempTestDir::new("validate_limit");
    let config = Config {
        database: Some(temp.path().join("db.sqlite")),
        commit_limit: Some(100),
        ..Default::default()
    };
    let err = config.validate().expect_err("should reject");
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
    assert!(err.to_string().contains("commit-limit"));
}

#[test]
fn test_validate_database_under_file_fails() {
    let temp = TempTestDir::new("validate_file_parent");
    let blocker = temp.path().join("not-a-dir");
    std::fs::write(&blocker, "x").expect("write");

    let config = Config {
        database: Some(blocker.join("sub").join("db.sqlite")),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::DatabaseDirectoryCreateFailed(_, _))
    ));
}
