//! Configuration for royalty-settle

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SettleError;

/// Default database path
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("royalty-settle")
        .join("settle.db")
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database file holding source tables and settlement lines
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Rows per INSERT statement when writing settlement lines
    #[serde(default = "default_insert_batch_size")]
    pub insert_batch_size: usize,
}

fn default_insert_batch_size() -> usize {
    500
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            insert_batch_size: default_insert_batch_size(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, SettleError> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| SettleError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }
}
