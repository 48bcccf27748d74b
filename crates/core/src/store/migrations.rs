//! Database schema migrations.
//!
//! Uses a simple version table approach to track applied migrations.

use super::StorageError;
use tokio_rusqlite::{Connection, params};

/// Migration list: (version, SQL), applied in order.
///
/// Every batch is idempotent (CREATE IF NOT EXISTS).
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_documents.sql"))];

/// Run any pending migrations.
///
/// Creates the `_migrations` table if needed, reads the current version,
/// and applies each newer batch in the same call.
pub async fn run(conn: &Connection) -> Result<(), StorageError> {
    conn.call(|conn| -> Result<(), StorageError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for (version, sql) in MIGRATIONS {
            if *version > current {
                conn.execute_batch(sql)
                    .map_err(|e| StorageError::MigrationFailed(format!("version {version}: {e}")))?;
                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                    params![version, chrono::Utc::now().to_rfc3339()],
                )?;
                tracing::debug!(version, "applied migration");
            }
        }

        Ok(())
    })
    .await
    .map_err(StorageError::from)
}
