//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (QUICKSAVE_*)
//! 2. TOML config file (if QUICKSAVE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (QUICKSAVE_*)
/// 2. TOML config file (if QUICKSAVE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database holding the document.
    ///
    /// Set via QUICKSAVE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// How long a cached document is served before it is reloaded.
    ///
    /// Set via QUICKSAVE_CACHE_TTL_MS environment variable.
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// Maximum serialized document size in bytes.
    ///
    /// Set via QUICKSAVE_QUOTA_BYTES environment variable.
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: u64,

    /// Usage ratio at which storage is reported as nearly full.
    ///
    /// Set via QUICKSAVE_STORAGE_WARNING_RATIO environment variable.
    #[serde(default = "default_warning_ratio")]
    pub storage_warning_ratio: f64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./quicksave.sqlite")
}

fn default_cache_ttl_ms() -> u64 {
    1_000
}

fn default_quota_bytes() -> u64 {
    10_485_760 // 10MB
}

fn default_warning_ratio() -> f64 {
    0.9
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_ttl_ms: default_cache_ttl_ms(),
            quota_bytes: default_quota_bytes(),
            storage_warning_ratio: default_warning_ratio(),
        }
    }
}

impl AppConfig {
    /// Cache TTL as Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `QUICKSAVE_`
    /// 2. TOML file from `QUICKSAVE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("QUICKSAVE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("QUICKSAVE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
