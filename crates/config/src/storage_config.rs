//! Storage configuration section

use crate::validation::{Checks, ConfigSection};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where and how the library database is kept
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file; relative paths are resolved against the data directory
    pub database_path: PathBuf,

    /// Use SQLite write-ahead logging
    pub enable_wal: bool,

    /// Connection pool size
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("earmark.db"),
            enable_wal: true,
            max_connections: 4,
        }
    }
}

impl ConfigSection for StorageConfig {
    const TABLE: &'static str = "storage";

    fn check(&self, checks: &mut Checks) {
        checks
            .ensure(
                "database_path",
                self.database_path.file_name().is_some(),
                "must name a file",
            )
            .within("max_connections", self.max_connections, 1..=32);
    }
}
