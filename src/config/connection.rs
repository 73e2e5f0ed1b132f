//! Metadata source drivers.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::metadata::{
    MetadataProvider, MetadataResult, SqliteMetadataProvider, StaticMetadataProvider,
};

/// Error type for connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Unsupported driver: {0}. Supported: sqlite, snapshot")]
    UnsupportedDriver(String),
}

/// Supported metadata sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// SQLite database file, introspected through pragmas
    Sqlite,
    /// JSON array of table snapshots
    Snapshot,
}

impl Driver {
    /// Parse driver from string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConnectionError> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            "snapshot" | "json" => Ok(Driver::Snapshot),
            other => Err(ConnectionError::UnsupportedDriver(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Sqlite => "sqlite",
            Driver::Snapshot => "snapshot",
        }
    }

    /// Open a provider serving `connection_id` from `path`.
    ///
    /// SQLite files are opened lazily on each fetch; snapshots are read
    /// up front.
    pub fn open(
        &self,
        connection_id: &str,
        path: &Path,
    ) -> MetadataResult<Arc<dyn MetadataProvider>> {
        let provider: Arc<dyn MetadataProvider> = match self {
            Driver::Sqlite => {
                Arc::new(SqliteMetadataProvider::new().with_database(connection_id, path))
            }
            Driver::Snapshot => Arc::new(StaticMetadataProvider::from_file(connection_id, path)?),
        };
        Ok(provider)
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
