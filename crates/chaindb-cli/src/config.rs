//! CLI settings read from `config.toml`.
//!
//! ```toml
//! database = "shop.chaindb"
//! output_format = "json"
//! sync_on_write = true
//! ```
//!
//! Every key is optional. Command-line flags override the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Database file used when neither `--db` nor the config file names one.
pub const DEFAULT_DATABASE: &str = "chaindb.db";

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Database file.
    pub database: Option<PathBuf>,
    /// Output format name: `table`, `json`, or `csv`.
    pub output_format: String,
    /// Sync the file after every mutation.
    pub sync_on_write: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            database: None,
            output_format: "table".to_string(),
            sync_on_write: false,
        }
    }
}

impl CliConfig {
    /// Parses the TOML file at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Loads the first config file found in [`Self::search_paths`], or the
    /// defaults when there is none.
    pub fn discover() -> Result<Self> {
        match Self::search_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => {
                debug!(path = %path.display(), "loading config");
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Candidate config files, most specific first:
    /// `<config dir>/chaindb/config.toml`, then `~/.chaindb/config.toml`.
    pub fn search_paths() -> Vec<PathBuf> {
        let platform = dirs::config_dir().map(|d| d.join("chaindb").join("config.toml"));
        let home = dirs::home_dir().map(|d| d.join(".chaindb").join("config.toml"));
        platform.into_iter().chain(home).collect()
    }

    /// Returns the database path, falling back to [`DEFAULT_DATABASE`].
    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert!(config.database.is_none());
        assert_eq!(config.output_format, "table");
        assert_eq!(config.database_path(), PathBuf::from("chaindb.db"));
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "database = \"/data/app.chaindb\"\noutput_format = \"csv\"\nsync_on_write = true\n",
        )
        .unwrap();

        let loaded = CliConfig::from_file(&path).unwrap();
        assert_eq!(loaded.database_path(), PathBuf::from("/data/app.chaindb"));
        assert_eq!(loaded.output_format, "csv");
        assert!(loaded.sync_on_write);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: CliConfig = toml::from_str("output_format = \"json\"").unwrap();
        assert_eq!(config.output_format, "json");
        assert!(config.database.is_none());
        assert!(!config.sync_on_write);

        let config: CliConfig = toml::from_str("").unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_bad_file_names_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "sync_on_write = \"maybe\"").unwrap();

        let err = CliConfig::from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
    }

    #[test]
    fn test_search_paths_end_in_config_toml() {
        for path in CliConfig::search_paths() {
            assert!(path.ends_with("config.toml"));
        }
    }
}
