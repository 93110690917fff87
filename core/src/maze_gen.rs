//! Maze generation by row sweep with set merging (Eller's algorithm)
//!
//! Every cell of the current row carries a set id; cells that share an id
//! are already connected through earlier rows.
//!
//! Algorithm:
//! 1. For each row except the last:
//!    - give every unassigned column a fresh set id
//!    - walk adjacent pairs: wall on a coin flip or when both sides share
//!      a set (a passage would close a cycle), otherwise merge the sets
//!    - walk columns: wall below on a coin flip, but never seal the last
//!      open way down out of a set
//!    - columns walled below forget their id and start fresh next row
//! 2. Last row: assign, place vertical walls as above, then knock down
//!    every wall between two different sets and seal the bottom border.
//!
//! The result is a spanning tree over the cells (a perfect maze).

use crate::rng::RandomSource;
use crate::walls::WallGrid;
use crate::{is_valid_size, Cell};

/// Set id meaning "not yet assigned in this row"
const UNASSIGNED: usize = 0;

/// Row-sweep maze generator
pub struct MazeGenerator<'r, R: RandomSource> {
    rng: &'r mut R,
    walls: WallGrid,
    line: Vec<usize>,
    next_set: usize,
    rows: usize,
    cols: usize,
}

impl<'r, R: RandomSource> MazeGenerator<'r, R> {
    /// Prepare a generator for a `rows x cols` maze.
    ///
    /// Sizes must already be validated (`1..=50`).
    pub fn new(rows: usize, cols: usize, rng: &'r mut R) -> Self {
        debug_assert!(is_valid_size(rows, cols), "maze size {rows}x{cols} not validated");

        Self {
            rng,
            walls: WallGrid::new(rows, cols),
            line: vec![UNASSIGNED; cols],
            next_set: UNASSIGNED + 1,
            rows,
            cols,
        }
    }

    /// Run the sweep and return the finished walls.
    pub fn generate(mut self) -> WallGrid {
        for row in 0..self.rows - 1 {
            self.assign_sets();
            self.place_vertical_walls(row);
            self.place_horizontal_walls(row);
            self.carry_forward(row);
        }
        self.finish_last_row();

        tracing::debug!(
            rows = self.rows,
            cols = self.cols,
            sets_used = self.next_set - 1,
            "maze generated"
        );
        self.walls
    }

    fn assign_sets(&mut self) {
        for set in self.line.iter_mut().filter(|set| **set == UNASSIGNED) {
            *set = self.next_set;
            self.next_set += 1;
        }
    }

    fn place_vertical_walls(&mut self, row: usize) {
        for col in 0..self.cols - 1 {
            let coin = self.rng.coin();
            if coin || self.line[col] == self.line[col + 1] {
                self.walls.set_right_wall(Cell::new(row, col), true);
            } else {
                self.merge_right_into(col);
            }
        }

        self.walls.set_right_wall(Cell::new(row, self.cols - 1), true);
    }

    /// Relabel every column carrying the set at `col + 1` with the set at `col`.
    fn merge_right_into(&mut self, col: usize) {
        let (keep, absorbed) = (self.line[col], self.line[col + 1]);
        for set in self.line.iter_mut().filter(|set| **set == absorbed) {
            *set = keep;
        }
    }

    fn place_horizontal_walls(&mut self, row: usize) {
        for col in 0..self.cols {
            let set = self.line[col];
            let cell = Cell::new(row, col);

            if self.rng.coin() && self.set_size(set) != 1 {
                self.walls.set_bottom_wall(cell, true);
            }
            // Undecided columns to the right still count as open here, so
            // only the last open member of a set can be forced back open.
            if self.open_below(set, row) == 0 {
                self.walls.set_bottom_wall(cell, false);
            }
        }
    }

    fn set_size(&self, set: usize) -> usize {
        self.line.iter().filter(|&&id| id == set).count()
    }

    fn open_below(&self, set: usize, row: usize) -> usize {
        (0..self.cols)
            .filter(|&col| self.line[col] == set && !self.walls.has_bottom_wall(Cell::new(row, col)))
            .count()
    }

    fn carry_forward(&mut self, row: usize) {
        for col in 0..self.cols {
            if self.walls.has_bottom_wall(Cell::new(row, col)) {
                self.line[col] = UNASSIGNED;
            }
        }
    }

    fn finish_last_row(&mut self) {
        let last = self.rows - 1;
        self.assign_sets();
        self.place_vertical_walls(last);

        for col in 0..self.cols - 1 {
            if self.line[col] != self.line[col + 1] {
                self.walls.set_right_wall(Cell::new(last, col), false);
                self.merge_right_into(col);
            }
            self.walls.set_bottom_wall(Cell::new(last, col), true);
        }
        self.walls.set_bottom_wall(Cell::new(last, self.cols - 1), true);
    }
}

/// Generate a perfect `rows x cols` maze from `rng`.
pub fn generate<R: RandomSource>(rows: usize, cols: usize, rng: &mut R) -> WallGrid {
    MazeGenerator::new(rows, cols, rng).generate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SimpleLCG;

    #[test]
    fn test_perfect_for_many_sizes_and_seeds() {
        let sizes = [(1, 1), (1, 7), (7, 1), (2, 2), (5, 5), (4, 9), (13, 3), (50, 50)];
        for (rows, cols) in sizes {
            for seed in [1, 42, 12345, 2918957128] {
                let walls = generate(rows, cols, &mut SimpleLCG::new(seed));
                assert_eq!(walls.rows(), rows);
                assert_eq!(walls.cols(), cols);
                assert_eq!(
                    walls.open_edges(),
                    rows * cols - 1,
                    "{}x{} seed {} is not a tree",
                    rows,
                    cols,
                    seed
                );
                assert!(walls.is_perfect(), "{}x{} seed {} not connected", rows, cols, seed);
            }
        }
    }

    #[test]
    fn test_borders_closed() {
        let walls = generate(6, 8, &mut SimpleLCG::new(7));
        for row in 0..6 {
            assert!(walls.has_right_wall(Cell::new(row, 7)));
        }
        for col in 0..8 {
            assert!(walls.has_bottom_wall(Cell::new(5, col)));
        }
    }

    #[test]
    fn test_determinism() {
        let maze1 = generate(10, 10, &mut SimpleLCG::new(99999));
        let maze2 = generate(10, 10, &mut SimpleLCG::new(99999));

        // Same seed should produce identical mazes
        assert_eq!(maze1, maze2);
    }

    #[test]
    fn test_different_seeds() {
        let maze1 = generate(10, 10, &mut SimpleLCG::new(11111));
        let maze2 = generate(10, 10, &mut SimpleLCG::new(22222));

        // Different seeds should (almost certainly) produce different mazes
        assert_ne!(maze1, maze2);
    }

    #[test]
    fn test_single_row_is_corridor() {
        let walls = generate(1, 6, &mut SimpleLCG::new(3));
        for col in 0..5 {
            assert!(!walls.has_right_wall(Cell::new(0, col)));
        }
    }
}
