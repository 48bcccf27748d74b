//! SQLite-backed document store.
//!
//! Opens the database, applies pragmas for WAL mode, runs migrations, and
//! keeps each document as one row of the `documents` key/value table.

use std::path::Path;

use async_trait::async_trait;
use tokio_rusqlite::rusqlite::OptionalExtension;
use tokio_rusqlite::{Connection, params};

use super::{DOCUMENT_KEY, DocumentStore, StorageError, decode, digest, encode, migrations};
use crate::model::Document;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// Document store handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread. Clones share the same connection.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pub(crate) conn: Connection,
    quota: Option<u64>,
}

impl SqliteStore {
    /// Open a store at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>, quota: Option<u64>) -> Result<Self, StorageError> {
        let conn = Connection::open(path).await.map_err(|e| StorageError::Database(e.into()))?;
        Self::init(conn, quota).await
    }

    /// Open an in-memory store for testing.
    pub async fn open_in_memory(quota: Option<u64>) -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StorageError::Database(e.into()))?;
        Self::init(conn, quota).await
    }

    async fn init(conn: Connection, quota: Option<u64>) -> Result<Self, StorageError> {
        conn.call(|conn| conn.execute_batch(PRAGMAS)).await?;
        migrations::run(&conn).await?;
        Ok(Self { conn, quota })
    }

    /// Read the raw value stored under `key`.
    ///
    /// The stored digest is checked before the bytes are returned.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Vec<u8>>, StorageError> {
                let row: Option<(Vec<u8>, String)> = conn
                    .query_row("SELECT value, digest FROM documents WHERE key = ?1", params![key], |row| {
                        Ok((row.get(0)?, row.get(1)?))
                    })
                    .optional()?;

                match row {
                    Some((value, expected)) if digest::verify(&value, &expected) => Ok(Some(value)),
                    Some(_) => Err(StorageError::Corrupt(format!("digest mismatch for key {key}"))),
                    None => Ok(None),
                }
            })
            .await
            .map_err(StorageError::from)
    }

    /// Replace the value stored under `key` in a single statement.
    ///
    /// Uses UPSERT semantics and bumps the row's revision on every write.
    pub async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let key = key.to_string();
        let digest = digest::compute_digest(&value);
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), StorageError> {
                conn.execute(
                    "INSERT INTO documents (key, value, digest, revision, updated_at)
                    VALUES (?1, ?2, ?3, 1, ?4)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        digest = excluded.digest,
                        revision = documents.revision + 1,
                        updated_at = excluded.updated_at",
                    params![key, value, digest, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(StorageError::from)
    }

    /// Number of writes applied to `key` (0 if never written).
    pub async fn revision(&self, key: &str) -> Result<i64, StorageError> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<i64, StorageError> {
                let revision = conn
                    .query_row("SELECT revision FROM documents WHERE key = ?1", params![key], |row| row.get(0))
                    .optional()?;
                Ok(revision.unwrap_or(0))
            })
            .await
            .map_err(StorageError::from)
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn load(&self) -> Result<Document, StorageError> {
        match self.get(DOCUMENT_KEY).await? {
            Some(bytes) => decode(&bytes),
            None => Ok(Document::default()),
        }
    }

    async fn save(&self, doc: &Document) -> Result<(), StorageError> {
        let bytes = encode(doc, self.quota)?;
        self.set(DOCUMENT_KEY, bytes).await
    }

    async fn bytes_in_use(&self) -> Result<u64, StorageError> {
        self.conn
            .call(|conn| -> Result<u64, StorageError> {
                let len: Option<i64> = conn
                    .query_row("SELECT length(value) FROM documents WHERE key = ?1", params![DOCUMENT_KEY], |row| {
                        row.get(0)
                    })
                    .optional()?;
                Ok(len.unwrap_or(0) as u64)
            })
            .await
            .map_err(StorageError::from)
    }

    fn quota_bytes(&self) -> Option<u64> {
        self.quota
    }
}
