//! Cycle breaking for the ranking pass.
//!
//! Ranking edges run from the referenced table to the referencing table, so
//! parent tables land in earlier ranks. A depth-first search over those
//! edges reverses every back-edge; the result is acyclic. Self-loops carry no
//! rank constraint and are left out.

/// Ranking edges `(tail, head)` derived from `(source, target)` foreign-key
/// endpoints, self-loops removed.
pub(crate) fn ranking_edges(
    endpoints: impl Iterator<Item = (usize, usize)>,
) -> Vec<(usize, usize)> {
    endpoints
        .filter(|(source, target)| source != target)
        .map(|(source, target)| (target, source))
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Reverse back-edges found by DFS.
///
/// Roots are tried in node order and each node's successors in head order,
/// so the same graph always yields the same acyclic orientation.
/// Returns the oriented edges and how many were reversed.
pub(crate) fn break_cycles(
    node_count: usize,
    edges: &[(usize, usize)],
) -> (Vec<(usize, usize)>, usize) {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for (idx, &(tail, _)) in edges.iter().enumerate() {
        adjacency[tail].push(idx);
    }
    for out in &mut adjacency {
        out.sort_by_key(|&idx| (edges[idx].1, idx));
    }

    let mut state = vec![Visit::New; node_count];
    let mut reversed = vec![false; edges.len()];

    for root in 0..node_count {
        if state[root] != Visit::New {
            continue;
        }
        state[root] = Visit::Active;
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

        while let Some(&(node, cursor)) = stack.last() {
            match adjacency[node].get(cursor) {
                Some(&edge_idx) => {
                    if let Some(top) = stack.last_mut() {
                        top.1 += 1;
                    }
                    let head = edges[edge_idx].1;
                    match state[head] {
                        Visit::New => {
                            state[head] = Visit::Active;
                            stack.push((head, 0));
                        }
                        Visit::Active => reversed[edge_idx] = true,
                        Visit::Done => {}
                    }
                }
                None => {
                    state[node] = Visit::Done;
                    stack.pop();
                }
            }
        }
    }

    let flipped = reversed.iter().filter(|&&r| r).count();
    let oriented = edges
        .iter()
        .zip(&reversed)
        .map(|(&(tail, head), &rev)| if rev { (head, tail) } else { (tail, head) })
        .collect();
    (oriented, flipped)
}
