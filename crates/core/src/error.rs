//! Unified error types for quicksave.
//!
//! Validation failures carry a stable code prefix; persistence failures are
//! wrapped from [`StorageError`] unchanged.

use rmcp::model::{ErrorCode, ErrorData as McpError};

pub use crate::store::StorageError;

/// Errors returned by the document service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The referenced item or tag id is absent from the current document.
    #[error("NOT_FOUND: {entity} {id}")]
    NotFound { entity: &'static str, id: String },

    /// Tag name collides case-insensitively with an existing tag.
    #[error("DUPLICATE_TAG: {0}")]
    DuplicateTag(String),

    /// Tag name is empty after trimming.
    #[error("EMPTY_NAME: tag name must not be empty")]
    EmptyName,

    /// Input failed a field constraint (e.g., title too long).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Backing store read or write did not complete.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl Error {
    pub(crate) fn item_not_found(id: &str) -> Self {
        Error::NotFound { entity: "item", id: id.to_string() }
    }

    pub(crate) fn tag_not_found(id: &str) -> Self {
        Error::NotFound { entity: "tag", id: id.to_string() }
    }

    /// True when the failure means the store is out of space and the user
    /// should free some before retrying.
    pub fn is_storage_full(&self) -> bool {
        matches!(self, Error::Storage(e) if e.is_storage_full())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) | Error::EmptyName => -32602,
            Error::NotFound { .. } => -32001,
            Error::DuplicateTag(_) => -32003,
            Error::Storage(e) if e.is_storage_full() => -32004,
            Error::Storage(_) => -32002,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
