//! Maze generation and path search for the maze explorer
//!
//! This crate owns everything below the presentation layer:
//! - a row-sweep set-merging generator that produces perfect mazes
//!   as two wall matrices ([`WallGrid`])
//! - the doubled-resolution [`OccupancyGrid`] derived from those walls
//! - two independent searches over it: A* ([`astar`]) and tabular
//!   Q-learning ([`qlearning`])
//! - the [`PathFinder`] façade that owns endpoint selection, and the
//!   [`Maze`] entity that ties walls, persistence and search together
//!
//! Randomness is injected through [`RandomSource`] so generation and
//! exploration are reproducible under a seed.

pub mod astar;
pub mod error;
pub mod matrix;
pub mod maze;
pub mod maze_gen;
pub mod occupancy;
pub mod pathfinder;
pub mod qlearning;
pub mod rng;
pub mod verify;
pub mod walls;

pub use error::{MazeError, PathError};
pub use matrix::Matrix;
pub use maze::Maze;
pub use maze_gen::MazeGenerator;
pub use occupancy::{Direction, Node, OccupancyGrid, Path};
pub use pathfinder::{Endpoint, PathFinder, PixelPoint, SelectionState, Viewport};
pub use qlearning::{episode_count, QLearningConfig};
pub use rng::{RandomSource, SimpleLCG};
pub use walls::WallGrid;

/// Smallest accepted maze side, in logical cells
pub const MIN_SIZE: usize = 1;

/// Largest accepted maze side, in logical cells
pub const MAX_SIZE: usize = 50;

/// Returns true when both sides are within `MIN_SIZE..=MAX_SIZE`.
pub fn is_valid_size(rows: usize, cols: usize) -> bool {
    (MIN_SIZE..=MAX_SIZE).contains(&rows) && (MIN_SIZE..=MAX_SIZE).contains(&cols)
}

/// A logical maze cell, 0-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Position of this cell in the doubled occupancy grid.
    pub const fn to_node(self) -> Node {
        Node::new(self.row * 2, self.col * 2)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_bounds() {
        assert!(is_valid_size(1, 1));
        assert!(is_valid_size(50, 50));
        assert!(!is_valid_size(0, 5));
        assert!(!is_valid_size(5, 0));
        assert!(!is_valid_size(51, 10));
        assert!(!is_valid_size(10, 51));
    }

    #[test]
    fn test_cell_doubling() {
        assert_eq!(Cell::new(0, 0).to_node(), Node::new(0, 0));
        assert_eq!(Cell::new(3, 2).to_node(), Node::new(6, 4));
    }
}
