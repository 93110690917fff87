//! A* search over the occupancy grid.
//!
//! 4-directional moves with unit cost, Manhattan heuristic. The heuristic
//! is admissible and consistent on this grid, so the first time the goal
//! is popped its path is a shortest one.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::error::PathError;
use crate::occupancy::{reconstruct_path, Node, OccupancyGrid, Path};
use crate::Cell;

#[derive(Clone, Copy, PartialEq, Eq)]
struct Frontier {
    node: Node,
    f_cost: usize, // g + h
    h_cost: usize,
    order: usize, // insertion counter, keeps equal-cost pops FIFO
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (lowest cost first)
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.h_cost.cmp(&self.h_cost))
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a shortest path between two logical cells.
///
/// Returns occupancy-grid nodes from `start` to `goal`, gate nodes
/// included. [`PathError::NoPath`] means the two cells are in separate
/// regions of the maze.
pub fn find_path(grid: &OccupancyGrid, start: Cell, goal: Cell) -> Result<Path, PathError> {
    for cell in [start, goal] {
        if !grid.contains_cell(cell) {
            return Err(PathError::OutOfBounds {
                row: cell.row,
                col: cell.col,
            });
        }
    }

    find_nodes(grid, start.to_node(), goal.to_node())
}

/// A* between two occupancy-grid nodes.
pub fn find_nodes(grid: &OccupancyGrid, start: Node, goal: Node) -> Result<Path, PathError> {
    if !grid.is_passable(start) || !grid.is_passable(goal) {
        return Err(PathError::NoPath);
    }

    if start == goal {
        return Ok(Path::new(vec![start]));
    }

    let mut open_set = BinaryHeap::new();
    let mut order = 0;
    let h_start = start.manhattan_distance(&goal);
    open_set.push(Frontier {
        node: start,
        f_cost: h_start,
        h_cost: h_start,
        order,
    });

    let mut came_from: HashMap<Node, Node> = HashMap::new();
    let mut g_score: HashMap<Node, usize> = HashMap::new();
    g_score.insert(start, 0);

    let mut closed_set: HashSet<Node> = HashSet::new();

    while let Some(Frontier { node: current, .. }) = open_set.pop() {
        if current == goal {
            tracing::debug!(expanded = closed_set.len(), "A* reached goal");
            return reconstruct_path(&came_from, start, goal).ok_or(PathError::NoPath);
        }

        if !closed_set.insert(current) {
            continue; // stale heap entry
        }

        let current_g = g_score.get(&current).copied().unwrap_or(usize::MAX);

        for neighbor in grid.neighbors(current) {
            if closed_set.contains(&neighbor) {
                continue;
            }

            let tentative_g = current_g + 1;

            if tentative_g < g_score.get(&neighbor).copied().unwrap_or(usize::MAX) {
                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative_g);

                let h_cost = neighbor.manhattan_distance(&goal);
                order += 1;
                open_set.push(Frontier {
                    node: neighbor,
                    f_cost: tentative_g + h_cost,
                    h_cost,
                    order,
                });
            }
        }
    }

    tracing::debug!(expanded = closed_set.len(), "A* frontier exhausted");
    Err(PathError::NoPath)
}
