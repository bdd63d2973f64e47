//! Database schema migrations.
//!
//! Creates the `captures` table on first open and records applied versions
//! in `schema_migrations`.

use rusqlite::Connection;
use tracing::info;

use snapvault_core::error::{Result, SnapvaultError};

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| {
        SnapvaultError::StorageUnavailable(format!("Failed to create migrations table: {}", e))
    })?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| {
            SnapvaultError::StorageUnavailable(format!("Failed to query migration version: {}", e))
        })?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: captures");
    }

    Ok(())
}

/// Version 1: captures table.
///
/// `created_at` is epoch milliseconds; `images` and `system_info` hold JSON.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS captures (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at      INTEGER NOT NULL
                            DEFAULT (CAST(strftime('%s', 'now') AS INTEGER) * 1000),
            images          TEXT NOT NULL DEFAULT '[]',
            system_info     TEXT NOT NULL DEFAULT '{}',
            capture_count   INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_captures_created_at
            ON captures (created_at DESC, id DESC);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'captures');
        ",
    )
    .map_err(|e| SnapvaultError::StorageUnavailable(format!("Migration v1 failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_run_once() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_column_defaults() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        conn.execute("INSERT INTO captures DEFAULT VALUES", []).unwrap();

        let (images, info, count, created_at): (String, String, i64, i64) = conn
            .query_row(
                "SELECT images, system_info, capture_count, created_at FROM captures",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(images, "[]");
        assert_eq!(info, "{}");
        assert_eq!(count, 0);
        assert!(created_at > 0);
    }
}
