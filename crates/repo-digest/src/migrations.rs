//! Database migrations for repo-digest
//!
//! This module provides schema migration functionality, allowing the database
//! schema to evolve over time while maintaining backward compatibility.

use rusqlite::{Connection, params};
use thiserror::Error;

/// Migration errors
#[derive(Debug, Error)]
pub enum MigrationError {
    /// SQLite error during migration
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Database schema is newer than this binary understands
    #[error("Database schema version {found} is newer than supported version {supported}")]
    TooNew { found: i32, supported: i32 },
}

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;

/// A database migration
pub struct Migration {
    /// Migration version number
    pub version: i32,
    /// Migration name/description
    pub name: &'static str,
    /// SQL to apply the migration
    pub up: &'static str,
}

/// All available migrations in order
pub static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    up: include_str!("schema.sql"),
}];

/// Get the current schema version from the database
///
/// Returns 0 if no migrations have been applied.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_version(conn: &Connection) -> Result<i32, MigrationError> {
    let table_exists: i32 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_migrations'",
        [],
        |row| row.get(0),
    )?;

    if table_exists == 0 {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    Ok(version)
}

/// Apply all pending migrations
///
/// # Errors
///
/// Returns an error if any migration fails, or if the database was written
/// by a newer version.
pub fn migrate(conn: &Connection) -> Result<Vec<i32>, MigrationError> {
    let current_version = get_version(conn)?;
    if current_version > CURRENT_VERSION {
        return Err(MigrationError::TooNew {
            found: current_version,
            supported: CURRENT_VERSION,
        });
    }

    let mut applied = Vec::new();
    for migration in MIGRATIONS {
        if migration.version > current_version {
            apply_migration(conn, migration)?;
            applied.push(migration.version);
        }
    }

    Ok(applied)
}

/// Apply a single migration and record it, atomically
///
/// # Errors
///
/// Returns an error if the migration fails.
pub fn apply_migration(conn: &Connection, migration: &Migration) -> Result<(), MigrationError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.up)?;
    tx.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
        params![
            migration.version,
            migration.name,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    tx.commit()?;

    tracing::debug!(version = migration.version, name = migration.name, "Applied migration");
    Ok(())
}

/// Check if the database is up to date
#[must_use]
pub fn is_up_to_date(conn: &Connection) -> bool {
    get_version(conn)
        .map(|v| v >= CURRENT_VERSION)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_get_version_empty_db() {
        let conn = Connection::open_in_memory().expect("create db");
        let version = get_version(&conn).expect("get version");
        assert_eq!(version, 0);
    }

    #[test]
    fn test_migrate_applies_all() {
        let conn = Connection::open_in_memory().expect("create db");
        let applied = migrate(&conn).expect("migrate");

        assert_eq!(applied, vec![1]);

        let version = get_version(&conn).expect("get version");
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_migrate_idempotent() {
        let conn = Connection::open_in_memory().expect("create db");

        let first = migrate(&conn).expect("first migrate");
        assert!(!first.is_empty());

        let second = migrate(&conn).expect("second migrate");
        assert!(second.is_empty(), "Second migrate should apply nothing");
    }

    #[test]
    fn test_is_up_to_date() {
        let conn = Connection::open_in_memory().expect("create db");

        assert!(!is_up_to_date(&conn));

        migrate(&conn).expect("migrate");

        assert!(is_up_to_date(&conn));
    }

    #[test]
    fn test_migration_creates_tables() {
        let conn = Connection::open_in_memory().expect("create db");
        migrate(&conn).expect("migrate");

        let tables = [
            "users",
            "projects",
            "user_projects",
            "commits",
            "schema_migrations",
        ];

        for table in tables {
            let exists: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                    [table],
                    |row| row.get(0),
                )
                .expect("query");
            assert_eq!(exists, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_migration_is_recorded() {
        let conn = Connection::open_in_memory().expect("create db");
        migrate(&conn).expect("migrate");

        let name: String = conn
            .query_row(
                "SELECT name FROM schema_migrations WHERE version = 1",
                [],
                |row| row.get(0),
            )
            .expect("query");
        assert_eq!(name, "initial_schema");
    }

    #[test]
    fn test_migrate_rejects_newer_schema() {
        let conn = Connection::open_in_memory().expect("create db");
        migrate(&conn).expect("migrate");
        conn.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (99, 'future', '2030-01-01T00:00:00Z')",
            [],
        )
        .expect("insert");

        let result = migrate(&conn);
        assert!(matches!(
            result,
            Err(MigrationError::TooNew { found: 99, .. })
        ));
    }
}
