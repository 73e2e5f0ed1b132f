//! In-memory [`MetadataProvider`] backed by captured table snapshots.
//!
//! Used for offline diagrams from a JSON snapshot file and as a fixture in
//! tests. A snapshot file holds the tables of one connection:
//!
//! ```text
//! [
//!   { "name": "users", "columns": [...], "foreignKeys": [...] },
//!   { "name": "orders", "columns": [...], "foreignKeys": [...] }
//! ]
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;

use super::error::{MetadataError, MetadataResult};
use super::provider::MetadataProvider;
use super::types::{ColumnInfo, ForeignKeyRef, TableSnapshot};

#[derive(Debug, Clone, Default)]
pub struct StaticMetadataProvider {
    connections: HashMap<String, Vec<TableSnapshot>>,
}

impl StaticMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the tables of a connection.
    pub fn with_connection(
        mut self,
        connection_id: impl Into<String>,
        tables: Vec<TableSnapshot>,
    ) -> Self {
        self.connections.insert(connection_id.into(), tables);
        self
    }

    /// Parse a snapshot document as the tables of `connection_id`.
    pub fn from_json(connection_id: impl Into<String>, json: &str) -> MetadataResult<Self> {
        let tables: Vec<TableSnapshot> = serde_json::from_str(json)?;
        Ok(Self::new().with_connection(connection_id, tables))
    }

    /// Load a snapshot file from disk as the tables of `connection_id`.
    pub fn from_file<P: AsRef<Path>>(
        connection_id: impl Into<String>,
        path: P,
    ) -> MetadataResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(connection_id, &content)
    }

    /// Connection ids, sorted.
    pub fn connection_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.connections.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    fn tables(&self, connection_id: &str) -> MetadataResult<&[TableSnapshot]> {
        self.connections
            .get(connection_id)
            .map(Vec::as_slice)
            .ok_or_else(|| MetadataError::ConnectionNotFound(connection_id.to_string()))
    }

    fn table(&self, connection_id: &str, table: &str) -> MetadataResult<&TableSnapshot> {
        self.tables(connection_id)?
            .iter()
            .find(|t| t.name == table)
            .ok_or_else(|| MetadataError::TableNotFound(table.to_string()))
    }
}

#[async_trait]
impl MetadataProvider for StaticMetadataProvider {
    async fn list_tables(&self, connection_id: &str) -> MetadataResult<Vec<String>> {
        Ok(self
            .tables(connection_id)?
            .iter()
            .map(|t| t.name.clone())
            .collect())
    }

    async fn get_columns(
        &self,
        connection_id: &str,
        table: &str,
    ) -> MetadataResult<Vec<ColumnInfo>> {
        Ok(self.table(connection_id, table)?.columns.clone())
    }

    async fn get_foreign_keys(
        &self,
        connection_id: &str,
        table: &str,
    ) -> MetadataResult<Vec<ForeignKeyRef>> {
        Ok(self.table(connection_id, table)?.foreign_keys.clone())
    }
}
