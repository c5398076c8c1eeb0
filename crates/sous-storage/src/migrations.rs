//! Database schema migrations.

use rusqlite::Connection;
use tracing::info;

use sous_core::error::SousError;

/// Bring the schema up to the latest version.
pub fn run_migrations(conn: &Connection) -> Result<(), SousError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| SousError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current = current_version(conn)?;
    if current < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: session_state");
    }

    Ok(())
}

pub fn current_version(conn: &Connection) -> Result<i64, SousError> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
    .map_err(|e| SousError::Storage(format!("Failed to query migration version: {}", e)))
}

/// Version 1: key-value table for the session record.
fn apply_v1(conn: &Connection) -> Result<(), SousError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS session_state (
            key         TEXT PRIMARY KEY NOT NULL,
            value       TEXT NOT NULL,
            updated_at  INTEGER NOT NULL
        );

        INSERT INTO schema_migrations (version, name) VALUES (1, 'session_state');
        ",
    )
    .map_err(|e| SousError::Storage(format!("Migration v1 failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), 1);

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, 1);
    }

    #[test]
    fn test_fresh_database_is_version_zero() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_migrations (version INTEGER PRIMARY KEY, name TEXT, applied_at INTEGER);",
        )
        .unwrap();
        assert_eq!(current_version(&conn).unwrap(), 0);
    }
}
