//! Metadata provider error types.

use std::io;
use thiserror::Error;

/// Result type for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors reported by a [`MetadataProvider`](super::MetadataProvider).
#[derive(Error, Debug)]
pub enum MetadataError {
    /// No connection is registered under this id.
    #[error("connection not found: {0}")]
    ConnectionNotFound(String),

    /// The table does not exist on the connection.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// Could not open or reach the database.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A metadata query failed on the backend.
    #[error("query error: {0}")]
    Query(String),

    /// SQLite driver error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Reading a snapshot file failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A snapshot file could not be parsed.
    #[error("invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// A blocking task panicked or was cancelled.
    #[error("metadata task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

impl MetadataError {
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Check if the error is about the connection rather than a single table.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::ConnectionNotFound(_) | Self::Connection(_))
    }
}
