//! MetadataProvider trait definition.
//!
//! The trait abstracts over the external connection that answers schema
//! questions. Implementations fail with a descriptive [`MetadataError`] on
//! connectivity or permission problems; callers never retry on their own.

use async_trait::async_trait;

use super::error::MetadataResult;
use super::types::{ColumnInfo, ForeignKeyRef};

/// Source of table, column and foreign-key metadata for a connection.
///
/// # Example
///
/// ```ignore
/// use schemagraph::metadata::MetadataProvider;
///
/// async fn example(provider: &impl MetadataProvider) -> MetadataResult<()> {
///     let tables = provider.list_tables("local").await?;
///     for table in &tables {
///         let columns = provider.get_columns("local", table).await?;
///         let fks = provider.get_foreign_keys("local", table).await?;
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// List table names on a connection, in the order the backend reports them.
    async fn list_tables(&self, connection_id: &str) -> MetadataResult<Vec<String>>;

    /// Columns of a table, in ordinal order.
    async fn get_columns(
        &self,
        connection_id: &str,
        table: &str,
    ) -> MetadataResult<Vec<ColumnInfo>>;

    /// Foreign keys declared on a table.
    async fn get_foreign_keys(
        &self,
        connection_id: &str,
        table: &str,
    ) -> MetadataResult<Vec<ForeignKeyRef>>;
}
