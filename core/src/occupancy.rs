//! Doubled-resolution occupancy grid derived from a [`WallGrid`].
//!
//! For an `R x C` maze the grid is `2R x 2C`:
//! - cell `(r, c)` maps to node `(2r, 2c)` and is always passable
//! - node `(2r, 2c + 1)` is the gate to the right, open iff there is no
//!   vertical wall (only for `c < C - 1`)
//! - node `(2r + 1, 2c)` is the gate below, open iff there is no
//!   horizontal wall (only for `r < R - 1`)
//! - every `(2r + 1, 2c + 1)` node is wall
//!
//! Walls between cells become ordinary blocked nodes, so both searches
//! move on a plain 4-connected grid with unit step cost.

use std::collections::HashMap;
use std::fmt;

use crate::matrix::Matrix;
use crate::walls::WallGrid;
use crate::Cell;

/// The four moves, in action-index order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Left = 0,
    Up = 1,
    Right = 2,
    Down = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Up,
        Direction::Right,
        Direction::Down,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Row and column delta of one step.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Left => (0, -1),
            Direction::Up => (-1, 0),
            Direction::Right => (0, 1),
            Direction::Down => (1, 0),
        }
    }

    /// Neighbouring cell. The caller checks that the move is open.
    pub(crate) fn step_cell(self, cell: Cell) -> Cell {
        let (dr, dc) = self.delta();
        Cell::new(
            cell.row.wrapping_add_signed(dr),
            cell.col.wrapping_add_signed(dc),
        )
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Left => "left",
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
        };
        f.write_str(name)
    }
}

/// A position in the occupancy grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub row: usize,
    pub col: usize,
}

impl Node {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The logical cell at this node, if it is a cell node and not a gate.
    pub fn to_cell(self) -> Option<Cell> {
        (self.row % 2 == 0 && self.col % 2 == 0).then(|| Cell::new(self.row / 2, self.col / 2))
    }

    pub fn manhattan_distance(&self, other: &Node) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// One step in `direction`; `None` when it would leave the top or left edge.
    pub fn step(self, direction: Direction) -> Option<Node> {
        let (dr, dc) = direction.delta();
        Some(Node::new(
            self.row.checked_add_signed(dr)?,
            self.col.checked_add_signed(dc)?,
        ))
    }

    pub fn is_adjacent(&self, other: &Node) -> bool {
        self.manhattan_distance(other) == 1
    }
}

/// Passable / wall map at doubled resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancyGrid {
    passable: Matrix<bool>,
}

impl OccupancyGrid {
    /// Expand wall matrices into the doubled grid.
    pub fn from_walls(walls: &WallGrid) -> Self {
        let (rows, cols) = (walls.rows(), walls.cols());
        let mut passable = Matrix::new(rows * 2, cols * 2);

        for row in 0..rows {
            for col in 0..cols {
                let cell = Cell::new(row, col);
                passable[(row * 2, col * 2)] = true;

                if col + 1 < cols {
                    passable[(row * 2, col * 2 + 1)] = !walls.has_right_wall(cell);
                }
                if row + 1 < rows {
                    passable[(row * 2 + 1, col * 2)] = !walls.has_bottom_wall(cell);
                }
            }
        }

        Self { passable }
    }

    /// Rows at doubled resolution.
    pub fn rows(&self) -> usize {
        self.passable.rows()
    }

    /// Columns at doubled resolution.
    pub fn cols(&self) -> usize {
        self.passable.cols()
    }

    pub fn logical_rows(&self) -> usize {
        self.rows() / 2
    }

    pub fn logical_cols(&self) -> usize {
        self.cols() / 2
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.rows() * self.cols()
    }

    pub fn is_empty(&self) -> bool {
        self.passable.is_empty()
    }

    pub fn contains_cell(&self, cell: Cell) -> bool {
        cell.row < self.logical_rows() && cell.col < self.logical_cols()
    }

    /// False for walls and for anything outside the grid.
    pub fn is_passable(&self, node: Node) -> bool {
        self.passable.get(node.row, node.col).copied().unwrap_or(false)
    }

    /// Dense index of a node, row-major.
    pub fn index(&self, node: Node) -> usize {
        node.row * self.cols() + node.col
    }

    /// Passable neighbours in left, up, right, down order.
    pub fn neighbors(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| node.step(direction))
            .filter(move |next| self.is_passable(*next))
    }

    /// Render with `#` for walls, `.` for open nodes and `o` for path nodes.
    pub fn render(&self, path: Option<&Path>) -> String {
        let mut canvas: Matrix<char> = Matrix::filled(self.rows(), self.cols(), '#');
        for row in 0..self.rows() {
            for col in 0..self.cols() {
                if self.passable[(row, col)] {
                    canvas[(row, col)] = '.';
                }
            }
        }
        for node in path.map(Path::nodes).unwrap_or_default() {
            if let Some(slot) = canvas.get_mut(node.row, node.col) {
                *slot = 'o';
            }
        }
        canvas
            .iter_rows()
            .map(|row| row.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for OccupancyGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}

/// Ordered occupancy-grid nodes from start to goal, both included.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Path {
    nodes: Vec<Node>,
}

impl Path {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of unit moves on the occupancy grid.
    pub fn steps(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn start(&self) -> Option<Node> {
        self.nodes.first().copied()
    }

    pub fn goal(&self) -> Option<Node> {
        self.nodes.last().copied()
    }

    /// The logical cells visited, with the gate nodes dropped.
    pub fn cells(&self) -> Vec<Cell> {
        self.nodes.iter().filter_map(|node| node.to_cell()).collect()
    }
}

/// Walk parent pointers back from `goal` and return the path in
/// start-to-goal order. `None` when the chain never reaches `start`.
pub(crate) fn reconstruct_path(
    parents: &HashMap<Node, Node>,
    start: Node,
    goal: Node,
) -> Option<Path> {
    let mut nodes = vec![goal];
    let mut current = goal;

    while current != start {
        current = *parents.get(&current)?;
        nodes.push(current);
        if nodes.len() > parents.len() + 1 {
            return None; // parent chain has a cycle
        }
    }

    nodes.reverse();
    Some(Path::new(nodes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> WallGrid {
        // 2x2: (0,0) -> (0,1) -> (1,1) -> (1,0)
        let mut walls = WallGrid::new(2, 2);
        walls.set_right_wall(Cell::new(0, 1), true);
        walls.set_right_wall(Cell::new(1, 1), true);
        walls.set_bottom_wall(Cell::new(0, 0), true);
        walls.set_bottom_wall(Cell::new(1, 0), true);
        walls.set_bottom_wall(Cell::new(1, 1), true);
        walls
    }

    #[test]
    fn test_expand_mapping() {
        let grid = OccupancyGrid::from_walls(&corridor());
        assert_eq!(grid.rows(), 4);
        assert_eq!(grid.cols(), 4);
        assert_eq!(grid.logical_rows(), 2);

        assert_eq!(grid.to_string(), "...#\n##.#\n...#\n####");
    }

    #[test]
    fn test_cells_always_passable_corners_never() {
        let walls = WallGrid::parse("2 3\n1 1 1\n1 1 1\n\n1 1 1\n1 1 1").unwrap();
        let grid = OccupancyGrid::from_walls(&walls);
        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                let node = Node::new(row, col);
                assert_eq!(grid.is_passable(node), node.to_cell().is_some());
            }
        }
    }

    #[test]
    fn test_out_of_bounds_is_wall() {
        let grid = OccupancyGrid::from_walls(&corridor());
        assert!(!grid.is_passable(Node::new(4, 0)));
        assert!(!grid.is_passable(Node::new(0, 4)));
        assert_eq!(Node::new(0, 0).step(Direction::Left), None);
        assert_eq!(Node::new(0, 0).step(Direction::Up), None);
    }

    #[test]
    fn test_neighbors_order() {
        let grid = OccupancyGrid::from_walls(&corridor());
        let around: Vec<Node> = grid.neighbors(Node::new(0, 1)).collect();
        assert_eq!(around, vec![Node::new(0, 0), Node::new(0, 2)]);
        let around: Vec<Node> = grid.neighbors(Node::new(2, 2)).collect();
        assert_eq!(around, vec![Node::new(2, 1), Node::new(1, 2)]);
    }

    #[test]
    fn test_reconstruct_orders_start_to_goal() {
        let mut parents = HashMap::new();
        parents.insert(Node::new(0, 1), Node::new(0, 0));
        parents.insert(Node::new(0, 2), Node::new(0, 1));
        let path = reconstruct_path(&parents, Node::new(0, 0), Node::new(0, 2)).unwrap();
        assert_eq!(
            path.nodes(),
            &[Node::new(0, 0), Node::new(0, 1), Node::new(0, 2)]
        );
        assert_eq!(path.cells(), vec![Cell::new(0, 0), Cell::new(0, 1)]);
        assert_eq!(path.steps(), 2);
    }

    #[test]
    fn test_reconstruct_missing_link() {
        let parents = HashMap::from([(Node::new(0, 2), Node::new(0, 1))]);
        assert!(reconstruct_path(&parents, Node::new(0, 0), Node::new(0, 2)).is_none());
    }
}
