//! Graph construction from table snapshots.
//!
//! Construction happens in two phases:
//! - Phase 1: one node per table, in table-list order
//! - Phase 2: one edge per foreign key, in table then foreign-key order
//!
//! References to tables outside the snapshot are dropped. This never fails.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::layout::NodeGeometry;
use crate::metadata::{ForeignKeyRef, TableSnapshot};

use super::{edge_id, source_port, target_port, GraphEdge, GraphNode, SchemaGraph};

/// Converts a load cycle's snapshots into a [`SchemaGraph`].
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    geometry: NodeGeometry,
}

impl GraphBuilder {
    pub fn new(geometry: NodeGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &NodeGeometry {
        &self.geometry
    }

    pub fn build(&self, tables: &[TableSnapshot]) -> SchemaGraph {
        let mut graph = SchemaGraph::new();

        // Phase 1: nodes
        // Duplicates keep their first snapshot so edges resolve against it too.
        let mut accepted: Vec<&TableSnapshot> = Vec::with_capacity(tables.len());
        for table in tables {
            let node = GraphNode {
                id: table.name.clone(),
                estimated_width: self.geometry.node_width,
                estimated_height: self.geometry.height(table.columns.len()),
                columns: table.columns.clone(),
            };
            if graph.add_node(node).is_some() {
                accepted.push(table);
            } else {
                warn!(table = %table.name, "duplicate table name, keeping first snapshot");
            }
        }

        // Phase 2: edges
        let mut seen_ids: HashMap<String, usize> = HashMap::new();
        for table in accepted {
            for fk in &table.foreign_keys {
                if !graph.contains(&fk.referenced_table) {
                    warn!(
                        table = %table.name,
                        column = %fk.column_name,
                        referenced_table = %fk.referenced_table,
                        "dropping foreign key to unknown table"
                    );
                    graph.record_dangling();
                    continue;
                }

                let edge = self.edge_for(&graph, table, fk, &mut seen_ids);
                graph.add_edge(edge);
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            dangling = graph.dangling_count(),
            "built schema graph"
        );
        graph
    }

    fn edge_for(
        &self,
        graph: &SchemaGraph,
        table: &TableSnapshot,
        fk: &ForeignKeyRef,
        seen_ids: &mut HashMap<String, usize>,
    ) -> GraphEdge {
        let base = edge_id(&table.name, &fk.column_name, &fk.referenced_table);
        let occurrences = seen_ids.entry(base.clone()).or_insert(0);
        *occurrences += 1;
        let id = if *occurrences == 1 {
            base
        } else {
            format!("{}#{}", base, occurrences)
        };

        let referenced_column = resolve_referenced_column(graph, fk);

        GraphEdge {
            id,
            source_node_id: table.name.clone(),
            source_port_id: source_port(&fk.column_name),
            target_node_id: fk.referenced_table.clone(),
            target_port_id: target_port(&referenced_column),
            label: (!fk.constraint_name.is_empty()).then(|| fk.constraint_name.clone()),
        }
    }
}

/// The referenced column, falling back to the target's primary key (then
/// its first column) when the reference leaves it implicit.
fn resolve_referenced_column(graph: &SchemaGraph, fk: &ForeignKeyRef) -> String {
    if !fk.referenced_column.is_empty() {
        return fk.referenced_column.clone();
    }

    graph
        .node(&fk.referenced_table)
        .and_then(|node| {
            node.columns
                .iter()
                .find(|c| c.is_primary_key)
                .or_else(|| node.columns.first())
        })
        .map(|c| c.name.clone())
        .unwrap_or_default()
}
