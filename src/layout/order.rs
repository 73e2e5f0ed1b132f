//! Crossing minimization within ranks.
//!
//! Alternating median sweeps: downward (rank 1..n against predecessors) then
//! upward (rank n-1..0 against successors). The best ordering seen by
//! adjacent-rank crossing count wins. Ties always fall back to node order,
//! which is table-list order.
//!
//! Edges must span exactly one rank. Longer edges are subdivided through
//! virtual nodes beforehand, so medians and crossings only ever compare
//! slots of adjacent layers.

use std::cmp::Ordering;

/// Adjacency over the acyclic ranking edges.
pub(crate) struct OrderingGraph {
    preds: Vec<Vec<usize>>,
    succs: Vec<Vec<usize>>,
}

impl OrderingGraph {
    pub(crate) fn new(node_count: usize, edges: &[(usize, usize)]) -> Self {
        let mut preds = vec![Vec::new(); node_count];
        let mut succs = vec![Vec::new(); node_count];
        for &(tail, head) in edges {
            succs[tail].push(head);
            preds[head].push(tail);
        }
        Self { preds, succs }
    }
}

/// Median of neighbour positions; the two middle values are averaged for
/// even counts. `None` when the node has no neighbours on that side.
fn median(neighbors: &[usize], position: &[usize]) -> Option<f64> {
    if neighbors.is_empty() {
        return None;
    }
    let mut positions: Vec<usize> = neighbors.iter().map(|&n| position[n]).collect();
    positions.sort_unstable();
    let mid = positions.len() / 2;
    Some(if positions.len() % 2 == 1 {
        positions[mid] as f64
    } else {
        (positions[mid - 1] + positions[mid]) as f64 / 2.0
    })
}

/// Reorder one layer by the median position of its neighbours.
///
/// Nodes without neighbours keep their current slot as their score.
fn reorder_layer(layer: &mut [usize], neighbors: &[Vec<usize>], position: &mut [usize]) {
    let mut scored: Vec<(usize, f64)> = layer
        .iter()
        .map(|&node| {
            let score = median(&neighbors[node], position).unwrap_or(position[node] as f64);
            (node, score)
        })
        .collect();

    scored.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    for (slot, (node, _)) in scored.into_iter().enumerate() {
        layer[slot] = node;
        position[node] = slot;
    }
}

/// Crossings between two adjacent layers.
fn count_crossings(
    upper: &[usize],
    lower: &[usize],
    graph: &OrderingGraph,
    position: &[usize],
    rank: &[usize],
) -> usize {
    let Some(&first) = lower.first() else {
        return 0;
    };
    let lower_rank = rank[first];

    let mut segments: Vec<(usize, usize)> = Vec::new();
    for &u in upper {
        for &v in &graph.succs[u] {
            if rank[v] == lower_rank {
                segments.push((position[u], position[v]));
            }
        }
    }

    let mut crossings = 0;
    for i in 0..segments.len() {
        for j in (i + 1)..segments.len() {
            let (a1, b1) = segments[i];
            let (a2, b2) = segments[j];
            if (a1 < a2 && b1 > b2) || (a1 > a2 && b1 < b2) {
                crossings += 1;
            }
        }
    }
    crossings
}

pub(crate) fn total_crossings(
    layers: &[Vec<usize>],
    graph: &OrderingGraph,
    position: &[usize],
    rank: &[usize],
) -> usize {
    layers
        .windows(2)
        .map(|pair| count_crossings(&pair[0], &pair[1], graph, position, rank))
        .sum()
}

/// Positions of every node within its layer.
pub(crate) fn positions(layers: &[Vec<usize>], node_count: usize) -> Vec<usize> {
    let mut position = vec![0usize; node_count];
    for layer in layers {
        for (slot, &node) in layer.iter().enumerate() {
            position[node] = slot;
        }
    }
    position
}

/// Run median sweeps until there are no crossings, a pass stops improving, or
/// `max_passes` is reached. Returns the crossing count of the kept ordering.
pub(crate) fn minimize_crossings(
    layers: &mut Vec<Vec<usize>>,
    graph: &OrderingGraph,
    rank: &[usize],
    max_passes: usize,
) -> usize {
    let node_count = rank.len();
    let mut position = positions(layers, node_count);
    let mut best_crossings = total_crossings(layers, graph, &position, rank);
    if layers.len() <= 1 {
        return best_crossings;
    }
    let mut best = layers.clone();

    for _ in 0..max_passes {
        if best_crossings == 0 {
            break;
        }

        for r in 1..layers.len() {
            reorder_layer(&mut layers[r], &graph.preds, &mut position);
        }
        for r in (0..layers.len() - 1).rev() {
            reorder_layer(&mut layers[r], &graph.succs, &mut position);
        }

        let crossings = total_crossings(layers, graph, &position, rank);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = layers.clone();
        } else {
            break;
        }
    }

    *layers = best;
    best_crossings
}
