//! Process-local document store.
//!
//! Holds the serialized document behind a mutex so a load never observes
//! a half-written value. Used for tests and throwaway sessions.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{DocumentStore, StorageError, decode, encode};
use crate::model::Document;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    value: Arc<Mutex<Option<Vec<u8>>>>,
    quota: Option<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects documents larger than `quota` bytes.
    pub fn with_quota(quota: u64) -> Self {
        Self { value: Arc::default(), quota: Some(quota) }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self) -> Result<Document, StorageError> {
        match self.value.lock().await.as_deref() {
            Some(bytes) => decode(bytes),
            None => Ok(Document::default()),
        }
    }

    async fn save(&self, doc: &Document) -> Result<(), StorageError> {
        let bytes = encode(doc, self.quota)?;
        *self.value.lock().await = Some(bytes);
        Ok(())
    }

    async fn bytes_in_use(&self) -> Result<u64, StorageError> {
        Ok(self.value.lock().await.as_ref().map_or(0, |bytes| bytes.len() as u64))
    }

    fn quota_bytes(&self) -> Option<u64> {
        self.quota
    }
}
