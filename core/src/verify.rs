//! Path validation against a maze.
//!
//! Checks, for a node path on the occupancy grid:
//! - the walk begins at the start and ends at the goal
//! - every step moves to an orthogonal neighbour
//! - no step leaves the grid or enters a wall

use crate::occupancy::{Node, OccupancyGrid};

/// Verify a start-to-goal node sequence on the occupancy grid.
pub fn verify_path(grid: &OccupancyGrid, nodes: &[Node], start: Node, goal: Node) -> bool {
    let (Some(&first), Some(&last)) = (nodes.first(), nodes.last()) else {
        return false;
    };
    if first != start || last != goal {
        return false;
    }
    if !nodes.iter().all(|&node| grid.is_passable(node)) {
        return false;
    }

    nodes.windows(2).all(|pair| pair[0].is_adjacent(&pair[1]))
}
