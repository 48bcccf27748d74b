//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_ttl_ms` exceeds 1 minute
    /// - `quota_bytes` is 0
    /// - `storage_warning_ratio` is outside (0, 1]
    /// - `db_path` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_ttl_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_ms".into(),
                reason: "must not exceed 1 minute (60000ms)".into(),
            });
        }
        if self.cache_ttl_ms == 0 {
            tracing::warn!("cache_ttl_ms is 0; every call reloads the document from storage");
        }

        if self.quota_bytes == 0 {
            return Err(ConfigError::Invalid { field: "quota_bytes".into(), reason: "must be greater than 0".into() });
        }

        if !(self.storage_warning_ratio > 0.0 && self.storage_warning_ratio <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "storage_warning_ratio".into(),
                reason: "must be greater than 0 and at most 1".into(),
            });
        }

        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Missing {
                field: "db_path".into(),
                hint: "Set QUICKSAVE_DB_PATH environment variable".into(),
            });
        }

        Ok(())
    }
}
