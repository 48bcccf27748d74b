//! Backing store adapters for the document.
//!
//! The whole [`Document`] is stored as one JSON value under [`DOCUMENT_KEY`].
//! Adapters provide:
//!
//! - Whole-value `load`/`save` that never expose a partial write
//! - An empty document when nothing has been stored yet
//! - A byte quota, enforced before anything is written
//! - SHA-256 digests to detect corrupted values on load

pub mod connection;
pub mod digest;
pub mod memory;
pub mod migrations;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_rusqlite::rusqlite;

use crate::model::Document;

pub use connection::SqliteStore;
pub use memory::MemoryStore;

/// Key of the single stored record.
pub const DOCUMENT_KEY: &str = "quicksaveData";

/// Failures of the backing store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The serialized document does not fit in the configured quota.
    #[error("STORAGE_FULL: document needs {needed} bytes, quota is {quota}")]
    QuotaExceeded { needed: u64, quota: u64 },

    /// The underlying medium reported it is out of space.
    #[error("STORAGE_FULL: {0}")]
    DiskFull(String),

    /// The store cannot be reached (e.g., the connection was closed).
    #[error("STORAGE_ERROR: unavailable: {0}")]
    Unavailable(String),

    /// Database operation failed.
    #[error("STORAGE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORAGE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored bytes failed digest verification or could not be decoded.
    #[error("STORAGE_ERROR: corrupt document: {0}")]
    Corrupt(String),

    /// Document could not be encoded.
    #[error("STORAGE_ERROR: serialization failed: {0}")]
    Serialization(Arc<serde_json::Error>),
}

impl StorageError {
    pub fn is_storage_full(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. } | StorageError::DiskFull(_))
    }
}

impl From<tokio_rusqlite::Error<StorageError>> for StorageError {
    fn from(err: tokio_rusqlite::Error<StorageError>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => StorageError::Unavailable("connection closed".into()),
            tokio_rusqlite::Error::Close(c) => StorageError::Database(tokio_rusqlite::Error::Close(c)),
            _ => StorageError::Unavailable("connection closed".into()),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for StorageError {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e.into(),
            tokio_rusqlite::Error::ConnectionClosed => StorageError::Unavailable("connection closed".into()),
            other => StorageError::Database(other),
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        if err.sqlite_error_code() == Some(rusqlite::ErrorCode::DiskFull) {
            return StorageError::DiskFull(err.to_string());
        }
        StorageError::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(Arc::new(err))
    }
}

/// Durable whole-document storage.
///
/// Both operations must appear atomic to concurrent callers in the same
/// process. A failed `save` leaves the previously stored document intact.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the stored document, or an empty one if nothing was stored.
    async fn load(&self) -> Result<Document, StorageError>;

    /// Replace the stored document.
    async fn save(&self, doc: &Document) -> Result<(), StorageError>;

    /// Size of the stored value in bytes (0 when nothing is stored).
    async fn bytes_in_use(&self) -> Result<u64, StorageError>;

    /// Configured byte quota, if any.
    fn quota_bytes(&self) -> Option<u64>;
}

/// Serialize a document, rejecting it if it would not fit in `quota`.
pub(crate) fn encode(doc: &Document, quota: Option<u64>) -> Result<Vec<u8>, StorageError> {
    let bytes = serde_json::to_vec(doc)?;
    if let Some(quota) = quota
        && bytes.len() as u64 > quota
    {
        return Err(StorageError::QuotaExceeded { needed: bytes.len() as u64, quota });
    }
    Ok(bytes)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Document, StorageError> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::Corrupt(e.to_string()))
}
