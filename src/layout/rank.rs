//! Longest-path rank assignment.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::warn;

/// Assign ranks over an acyclic edge set.
///
/// Nodes with no incoming edge get rank 0; every other node gets
/// 1 + max(rank of its predecessors). Disconnected components each start at
/// rank 0 and every edge points from a lower to a higher rank.
pub(crate) fn assign_ranks(node_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut graph = DiGraph::<(), ()>::with_capacity(node_count, edges.len());
    for _ in 0..node_count {
        graph.add_node(());
    }
    for &(tail, head) in edges {
        graph.add_edge(NodeIndex::new(tail), NodeIndex::new(head), ());
    }

    let order = match toposort(&graph, None) {
        Ok(order) => order,
        Err(cycle) => {
            // break_cycles guarantees a DAG; fall back to node order regardless
            warn!(node = cycle.node_id().index(), "ranking graph is cyclic, using node order");
            graph.node_indices().collect()
        }
    };

    let mut ranks = vec![0usize; node_count];
    for node in order {
        let rank = ranks[node.index()];
        for succ in graph.neighbors(node) {
            let slot = &mut ranks[succ.index()];
            *slot = (*slot).max(rank + 1);
        }
    }
    ranks
}

/// Group nodes by rank: `layers[r]` holds the nodes of rank `r` in node order.
pub(crate) fn build_layers(ranks: &[usize]) -> Vec<Vec<usize>> {
    let Some(&max_rank) = ranks.iter().max() else {
        return Vec::new();
    };
    let mut layers = vec![Vec::new(); max_rank + 1];
    for (node, &rank) in ranks.iter().enumerate() {
        layers[rank].push(node);
    }
    layers
}

/// Split every edge spanning more than one rank into a chain of unit-span
/// segments through virtual nodes.
///
/// Virtual nodes get indices from `ranks.len()` upward in edge order, so they
/// sort after every real node within a layer. Returns the extended rank
/// vector and the subdivided edge list.
pub(crate) fn subdivide_long_edges(
    ranks: &[usize],
    edges: &[(usize, usize)],
) -> (Vec<usize>, Vec<(usize, usize)>) {
    let mut extended = ranks.to_vec();
    let mut segments = Vec::with_capacity(edges.len());

    for &(tail, head) in edges {
        let (from, to) = (ranks[tail], ranks[head]);
        if to <= from + 1 {
            segments.push((tail, head));
            continue;
        }

        let mut previous = tail;
        for rank in (from + 1)..to {
            let virtual_node = extended.len();
            extended.push(rank);
            segments.push((previous, virtual_node));
            previous = virtual_node;
        }
        segments.push((previous, head));
    }

    (extended, segments)
}
