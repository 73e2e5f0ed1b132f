//! SQLite implementation of [`MetadataProvider`].
//!
//! Each call opens the database file read-only on a blocking thread, so the
//! provider itself holds only the connection id → path registry and is cheap
//! to share across concurrent fetches.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags};

use super::error::{MetadataError, MetadataResult};
use super::provider::MetadataProvider;
use super::types::{ColumnInfo, ForeignKeyRef};

/// MetadataProvider that introspects SQLite database files.
///
/// # Example
///
/// ```ignore
/// use schemagraph::metadata::SqliteMetadataProvider;
///
/// let provider = SqliteMetadataProvider::new().with_database("local", "./app.db");
/// let tables = provider.list_tables("local").await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct SqliteMetadataProvider {
    databases: HashMap<String, PathBuf>,
}

impl SqliteMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a database file under a connection id.
    pub fn with_database(
        mut self,
        connection_id: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        self.register(connection_id, path);
        self
    }

    pub fn register(&mut self, connection_id: impl Into<String>, path: impl Into<PathBuf>) {
        self.databases.insert(connection_id.into(), path.into());
    }

    /// Registered connection ids, sorted.
    pub fn connection_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.databases.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    fn path_for(&self, connection_id: &str) -> MetadataResult<PathBuf> {
        self.databases
            .get(connection_id)
            .cloned()
            .ok_or_else(|| MetadataError::ConnectionNotFound(connection_id.to_string()))
    }

    /// Run a query against a connection on the blocking pool.
    async fn run<T, F>(&self, connection_id: &str, f: F) -> MetadataResult<T>
    where
        F: FnOnce(&Connection) -> MetadataResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path_for(connection_id)?;
        tokio::task::spawn_blocking(move || {
            let conn = open_read_only(&path)?;
            f(&conn)
        })
        .await?
    }
}

fn open_read_only(path: &Path) -> MetadataResult<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| MetadataError::Connection(format!("{}: {}", path.display(), e)))
}

/// User tables, ordered by name.
pub(crate) fn query_tables(conn: &Connection) -> MetadataResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

fn table_exists(conn: &Connection, table: &str) -> MetadataResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub(crate) fn query_columns(conn: &Connection, table: &str) -> MetadataResult<Vec<ColumnInfo>> {
    if !table_exists(conn, table)? {
        return Err(MetadataError::TableNotFound(table.to_string()));
    }

    let mut stmt =
        conn.prepare("SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
        .query_map(params![table], |row| {
            let not_null: i64 = row.get(2)?;
            let pk: i64 = row.get(3)?;
            Ok(ColumnInfo {
                name: row.get(0)?,
                data_type: row.get(1)?,
                is_primary_key: pk > 0,
                nullable: not_null == 0 && pk == 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

pub(crate) fn query_foreign_keys(
    conn: &Connection,
    table: &str,
) -> MetadataResult<Vec<ForeignKeyRef>> {
    if !table_exists(conn, table)? {
        return Err(MetadataError::TableNotFound(table.to_string()));
    }

    let mut stmt = conn.prepare(
        "SELECT id, \"table\", \"from\", \"to\" FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
    )?;
    let fks = stmt
        .query_map(params![table], |row| {
            let id: i64 = row.get(0)?;
            Ok(ForeignKeyRef {
                referenced_table: row.get(1)?,
                column_name: row.get(2)?,
                // NULL when the constraint targets the primary key implicitly
                referenced_column: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                constraint_name: format!("fk_{}", id),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(fks)
}

#[async_trait]
impl MetadataProvider for SqliteMetadataProvider {
    async fn list_tables(&self, connection_id: &str) -> MetadataResult<Vec<String>> {
        self.run(connection_id, query_tables).await
    }

    async fn get_columns(
        &self,
        connection_id: &str,
        table: &str,
    ) -> MetadataResult<Vec<ColumnInfo>> {
        let table = table.to_string();
        self.run(connection_id, move |conn| query_columns(conn, &table))
            .await
    }

    async fn get_foreign_keys(
        &self,
        connection_id: &str,
        table: &str,
    ) -> MetadataResult<Vec<ForeignKeyRef>> {
        let table = table.to_string();
        self.run(connection_id, move |conn| query_foreign_keys(conn, &table))
            .await
    }
}
