//! Hierarchical (layered) layout for schema graphs.
//!
//! Implements a Sugiyama-style layout in four phases:
//!   1. Cycle breaking (DFS back-edge reversal)
//!   2. Rank assignment (longest path from sources)
//!   3. Ordering within ranks (median crossing minimization)
//!   4. Coordinate assignment (ranks left to right, centred stacks)
//!
//! Referenced tables rank before the tables that reference them, so
//! `orders.user_id → users.id` puts `users` left of `orders`.
//!
//! All output is deterministic: the same graph always yields the same layout.

mod acyclic;
mod coords;
mod geometry;
mod order;
mod rank;

pub use geometry::{node_height, NodeGeometry};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::SchemaGraph;

use acyclic::{break_cycles, ranking_edges};
use coords::assign_coordinates;
use order::{minimize_crossings, positions, OrderingGraph};
use rank::{assign_ranks, build_layers, subdivide_long_edges};

// ── Configuration ────────────────────────────────────────────────────

/// Layout constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub base_height: f64,
    pub row_height: f64,
    /// Horizontal gap between ranks.
    pub rank_gap: f64,
    /// Vertical gap between nodes of one rank.
    pub node_gap: f64,
    /// Cap on crossing-minimization passes.
    pub max_ordering_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let geometry = NodeGeometry::default();
        Self {
            node_width: geometry.node_width,
            base_height: geometry.base_height,
            row_height: geometry.row_height,
            rank_gap: 120.0,
            node_gap: 40.0,
            max_ordering_passes: 24,
        }
    }
}

impl LayoutConfig {
    pub fn geometry(&self) -> NodeGeometry {
        NodeGeometry {
            node_width: self.node_width,
            base_height: self.base_height,
            row_height: self.row_height,
        }
    }
}

// ── Output types ─────────────────────────────────────────────────────

/// Top-left corner of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };
}

/// Where one node ended up.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePlacement {
    pub id: String,
    pub position: Position,
    pub rank: usize,
    /// Slot within the rank, top to bottom.
    pub order: usize,
}

/// Positions for every node of a graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    /// In table-list order.
    placements: Vec<NodePlacement>,
    rank_count: usize,
    crossings: usize,
    reversed_edges: usize,
    #[serde(skip)]
    ranking_edges: Vec<(String, String)>,
    #[serde(skip)]
    geometry: NodeGeometry,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl LayoutResult {
    fn empty(geometry: NodeGeometry) -> Self {
        Self {
            placements: Vec::new(),
            rank_count: 0,
            crossings: 0,
            reversed_edges: 0,
            ranking_edges: Vec::new(),
            geometry,
            index: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn placements(&self) -> &[NodePlacement] {
        &self.placements
    }

    pub fn placement(&self, id: &str) -> Option<&NodePlacement> {
        self.index.get(id).map(|&i| &self.placements[i])
    }

    pub fn position(&self, id: &str) -> Option<Position> {
        self.placement(id).map(|p| p.position)
    }

    pub fn rank(&self, id: &str) -> Option<usize> {
        self.placement(id).map(|p| p.rank)
    }

    /// Node id → position.
    pub fn positions(&self) -> HashMap<String, Position> {
        self.placements
            .iter()
            .map(|p| (p.id.clone(), p.position))
            .collect()
    }

    /// Node ids of one rank, top to bottom.
    pub fn rank_members(&self, rank: usize) -> Vec<&str> {
        let mut members: Vec<&NodePlacement> =
            self.placements.iter().filter(|p| p.rank == rank).collect();
        members.sort_by_key(|p| p.order);
        members.into_iter().map(|p| p.id.as_str()).collect()
    }

    pub fn rank_count(&self) -> usize {
        self.rank_count
    }

    /// Adjacent-rank crossings left after ordering.
    pub fn crossings(&self) -> usize {
        self.crossings
    }

    /// Edges reversed to break cycles.
    pub fn reversed_edges(&self) -> usize {
        self.reversed_edges
    }

    /// `(tail, head)` table pairs the ranking ran on, after cycle breaking.
    pub fn ranking_edges(&self) -> &[(String, String)] {
        &self.ranking_edges
    }

    /// Top-left of a column row inside a placed node.
    pub fn column_anchor(&self, id: &str, column_index: usize) -> Option<Position> {
        self.position(id)
            .map(|p| self.geometry.column_anchor(p, column_index))
    }
}

// ── Engine ───────────────────────────────────────────────────────────

/// Computes a [`LayoutResult`] for a [`SchemaGraph`].
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out a graph. Empty, disconnected and cyclic graphs all succeed.
    pub fn layout(&self, graph: &SchemaGraph) -> LayoutResult {
        let n = graph.node_count();
        if n == 0 {
            return LayoutResult::empty(self.config.geometry());
        }

        // Phase 1: cycle breaking
        let edges = ranking_edges(graph.edge_endpoints());
        let (acyclic, reversed_edges) = break_cycles(n, &edges);

        // Phase 2: ranks
        let rank = assign_ranks(n, &acyclic);
        let (chained_rank, segments) = subdivide_long_edges(&rank, &acyclic);
        let mut layers = build_layers(&chained_rank);

        // Phase 3: ordering
        let ordering = OrderingGraph::new(chained_rank.len(), &segments);
        let crossings = minimize_crossings(
            &mut layers,
            &ordering,
            &chained_rank,
            self.config.max_ordering_passes,
        );
        for layer in &mut layers {
            layer.retain(|&node| node < n);
        }

        // Phase 4: coordinates
        let sizes: Vec<(f64, f64)> = graph
            .nodes()
            .map(|node| (node.estimated_width, node.estimated_height))
            .collect();
        let coords = assign_coordinates(&layers, &sizes, &self.config);
        let order = positions(&layers, n);

        let ids: Vec<&str> = graph.nodes().map(|node| node.id.as_str()).collect();
        let placements: Vec<NodePlacement> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| NodePlacement {
                id: id.to_string(),
                position: coords[i],
                rank: rank[i],
                order: order[i],
            })
            .collect();
        let index = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.to_string(), i))
            .collect();
        let ranking_edges = acyclic
            .iter()
            .map(|&(tail, head)| (ids[tail].to_string(), ids[head].to_string()))
            .collect();

        debug!(
            nodes = n,
            ranks = layers.len(),
            virtual_nodes = chained_rank.len() - n,
            crossings,
            reversed_edges,
            "computed layout"
        );

        LayoutResult {
            placements,
            rank_count: layers.len(),
            crossings,
            reversed_edges,
            ranking_edges,
            geometry: self.config.geometry(),
            index,
        }
    }
}
