//! Core types and persistence for quicksave.
//!
//! This crate provides:
//! - The saved-item/tag document model and its validation rules
//! - Backing store adapters (SQLite, in-memory) for the whole document
//! - A cached document service with a bounded staleness window
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod model;
pub mod service;
pub mod store;

pub use config::AppConfig;
pub use error::Error;
pub use model::{Document, Item, ItemPatch, ItemType, NewItem, Tag, TagColor};
pub use service::{DocumentService, StorageStatus};
pub use store::{DocumentStore, MemoryStore, SqliteStore, StorageError};
