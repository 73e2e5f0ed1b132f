//! Table metadata types shared by providers, the aggregator and the graph builder.

use serde::{Deserialize, Serialize};

/// A single column as reported by the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Database-specific type name.
    pub data_type: String,
    /// Whether the column is part of the primary key.
    #[serde(default)]
    pub is_primary_key: bool,
    /// Whether NULL values are allowed.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_primary_key: false,
            nullable: true,
        }
    }

    /// Primary-key column (implies NOT NULL).
    pub fn primary_key(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_primary_key: true,
            nullable: false,
        }
    }
}

/// A foreign key column reference.
///
/// `referenced_column` may be empty when the database leaves it implicit
/// (the referenced table's primary key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyRef {
    /// Column in the referencing table.
    pub column_name: String,
    /// Name of the referenced table.
    pub referenced_table: String,
    /// Column in the referenced table.
    #[serde(default)]
    pub referenced_column: String,
    /// Constraint name.
    #[serde(default)]
    pub constraint_name: String,
}

impl ForeignKeyRef {
    pub fn new(
        column_name: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            column_name: column_name.into(),
            referenced_table: referenced_table.into(),
            referenced_column: referenced_column.into(),
            constraint_name: String::new(),
        }
    }

    pub fn with_constraint(mut self, name: impl Into<String>) -> Self {
        self.constraint_name = name.into();
        self
    }
}

/// Columns and foreign keys of one table, captured during a single load cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyRef>,
}

impl TableSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnInfo) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_foreign_key(mut self, fk: ForeignKeyRef) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// First primary-key column, if any.
    pub fn primary_key_column(&self) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.is_primary_key)
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}
