//! Schema graph: tables as nodes, foreign keys as edges.
//!
//! The graph is rebuilt from scratch for every load cycle. Node indices
//! follow table-list order and edge indices follow foreign-key emission
//! order, which the layout engine relies on for tie-breaking.

mod builder;
mod fingerprint;
mod types;

pub use builder::GraphBuilder;
pub use fingerprint::schema_fingerprint;
pub use types::{edge_id, source_port, target_port, GraphEdge, GraphNode};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Directed graph of tables and foreign-key references.
///
/// Edges point from the referencing table to the referenced table.
/// Multi-edges and self-references are allowed; edges to tables outside the
/// graph are not.
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    graph: DiGraph<GraphNode, GraphEdge>,

    /// Index: table name → NodeIndex
    node_index: HashMap<String, NodeIndex>,

    /// Foreign keys dropped because their target table was unknown
    dangling_count: usize,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Returns `None` if a node with the same id already exists.
    pub fn add_node(&mut self, node: GraphNode) -> Option<NodeIndex> {
        if self.node_index.contains_key(&node.id) {
            return None;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_index.insert(id, idx);
        Some(idx)
    }

    /// Add an edge between existing nodes. Returns `false` if either end is unknown.
    pub fn add_edge(&mut self, edge: GraphEdge) -> bool {
        let (Some(&from), Some(&to)) = (
            self.node_index.get(&edge.source_node_id),
            self.node_index.get(&edge.target_node_id),
        ) else {
            return false;
        };
        self.graph.add_edge(from, to, edge);
        true
    }

    pub(crate) fn record_dangling(&mut self) {
        self.dangling_count += 1;
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn dangling_count(&self) -> usize {
        self.dangling_count
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index.get(id).map(|&idx| &self.graph[idx])
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_index.get(id).copied()
    }

    /// Nodes in table-list order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// Edges in emission order.
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.graph.edge_weights()
    }

    /// Edges as `(source index, target index)` in emission order.
    pub fn edge_endpoints(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()))
    }

    /// Edges leaving a table (its foreign keys).
    pub fn outgoing(&self, id: &str) -> Vec<&GraphEdge> {
        self.edges().filter(|e| e.source_node_id == id).collect()
    }

    /// Edges arriving at a table (foreign keys referencing it).
    pub fn incoming(&self, id: &str) -> Vec<&GraphEdge> {
        self.edges().filter(|e| e.target_node_id == id).collect()
    }

    /// The underlying petgraph graph.
    pub fn inner(&self) -> &DiGraph<GraphNode, GraphEdge> {
        &self.graph
    }

    /// Clone out nodes and edges for presentation.
    pub fn to_parts(&self) -> (Vec<GraphNode>, Vec<GraphEdge>) {
        (self.nodes().cloned().collect(), self.edges().cloned().collect())
    }
}
