//! Database configuration structures.
//!
//! These structures define how a database file is opened.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ChainError, ChainResult};

/// Main database configuration.
///
/// # Example
///
/// ```rust
/// use chaindb_common::config::DatabaseConfig;
///
/// let config = DatabaseConfig::with_path("/tmp/example.chaindb");
/// assert!(config.create_if_missing);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path of the database file.
    pub path: PathBuf,

    /// Initialize a fresh database when the file is missing or empty.
    /// Default: true
    pub create_if_missing: bool,

    /// Discard existing contents and re-initialize the file on open.
    /// Default: false
    pub truncate_existing: bool,

    /// Flush the file to durable storage after every mutating operation.
    /// Default: false
    pub sync_on_write: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data.chaindb"),
            create_if_missing: true,
            truncate_existing: false,
            sync_on_write: false,
        }
    }
}

impl DatabaseConfig {
    /// Creates a new configuration for the specified file.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Creates a configuration for tests: always starts from an empty file.
    #[must_use]
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create_if_missing: true,
            truncate_existing: true,
            sync_on_write: false,
        }
    }

    /// Sets whether every mutation is synced to disk.
    #[must_use]
    pub fn sync_on_write(mut self, sync: bool) -> Self {
        self.sync_on_write = sync;
        self
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> ChainResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(ChainError::InvalidConfig {
                message: "path must not be empty".to_string(),
            });
        }

        if self.truncate_existing && !self.create_if_missing {
            return Err(ChainError::InvalidConfig {
                message: "truncate_existing requires create_if_missing".to_string(),
            });
        }

        Ok(())
    }
}
