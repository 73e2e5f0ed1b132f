//! Node sizing shared by the graph builder and the layout engine.

use serde::{Deserialize, Serialize};

use super::Position;

/// Fixed node dimensions. Heights grow with the column count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeGeometry {
    pub node_width: f64,
    /// Table header height.
    pub base_height: f64,
    /// Height of one column row.
    pub row_height: f64,
}

impl Default for NodeGeometry {
    fn default() -> Self {
        Self {
            node_width: 250.0,
            base_height: 40.0,
            row_height: 28.0,
        }
    }
}

/// Estimated height of a table with `column_count` columns.
///
/// Every size computation goes through here so no two call sites can drift.
pub fn node_height(column_count: usize, geometry: &NodeGeometry) -> f64 {
    geometry.base_height + column_count as f64 * geometry.row_height
}

impl NodeGeometry {
    pub fn height(&self, column_count: usize) -> f64 {
        node_height(column_count, self)
    }

    /// Offset of a column row below the first row.
    pub fn column_offset(&self, column_index: usize) -> f64 {
        self.row_height * column_index as f64
    }

    /// Top-left corner of a column row, given the node's top-left corner.
    pub fn column_anchor(&self, node: Position, column_index: usize) -> Position {
        Position {
            x: node.x,
            y: node.y + self.base_height + self.column_offset(column_index),
        }
    }
}
