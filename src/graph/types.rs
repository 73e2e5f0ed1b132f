//! Node and edge payloads of the schema graph.

use serde::{Deserialize, Serialize};

use crate::metadata::ColumnInfo;

/// One table in the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Table name; unique within the graph.
    pub id: String,
    pub estimated_width: f64,
    /// Derived from the column count via [`crate::layout::node_height`].
    pub estimated_height: f64,
    pub columns: Vec<ColumnInfo>,
}

impl GraphNode {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

/// One foreign-key reference, drawn from the referencing column to the
/// referenced column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    /// Referencing table.
    pub source_node_id: String,
    /// `<column>-source`
    pub source_port_id: String,
    /// Referenced table.
    pub target_node_id: String,
    /// `<column>-target`
    pub target_port_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GraphEdge {
    pub fn is_self_reference(&self) -> bool {
        self.source_node_id == self.target_node_id
    }
}

/// Port id for the referencing end of an edge.
pub fn source_port(column: &str) -> String {
    format!("{}-source", column)
}

/// Port id for the referenced end of an edge.
pub fn target_port(column: &str) -> String {
    format!("{}-target", column)
}

/// Edge id before collision suffixing.
pub fn edge_id(source_table: &str, column: &str, referenced_table: &str) -> String {
    format!("e-{}-{}-{}", source_table, column, referenced_table)
}
