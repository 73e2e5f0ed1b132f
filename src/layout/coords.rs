//! Coordinate assignment, left to right.

use super::{LayoutConfig, Position};

/// Place every node given its layer ordering and `(width, height)` size.
///
/// Rank `r` sits at the summed widest-node widths of the preceding ranks
/// plus one `rank_gap` each; all nodes of a rank share that x. Within a rank
/// nodes stack downward separated by `node_gap`, and the stack is shifted so
/// its centre lines up with the centre of the tallest rank.
pub(crate) fn assign_coordinates(
    layers: &[Vec<usize>],
    sizes: &[(f64, f64)],
    config: &LayoutConfig,
) -> Vec<Position> {
    let mut positions = vec![Position::ORIGIN; sizes.len()];

    let extents: Vec<f64> = layers
        .iter()
        .map(|layer| {
            let heights: f64 = layer.iter().map(|&n| sizes[n].1).sum();
            heights + config.node_gap * layer.len().saturating_sub(1) as f64
        })
        .collect();
    let tallest = extents.iter().copied().fold(0.0_f64, f64::max);

    let mut x = 0.0;
    for (layer, extent) in layers.iter().zip(&extents) {
        let mut y = (tallest - extent) / 2.0;
        for &node in layer {
            positions[node] = Position { x, y };
            y += sizes[node].1 + config.node_gap;
        }

        let widest = layer.iter().map(|&n| sizes[n].0).fold(0.0_f64, f64::max);
        x += widest + config.rank_gap;
    }

    positions
}
