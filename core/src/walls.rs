//! Wall matrices of a rectangular maze and their text format.
//!
//! `vertical[(r, c)]` is the wall between `(r, c)` and `(r, c + 1)`;
//! `horizontal[(r, c)]` is the wall between `(r, c)` and `(r + 1, c)`.
//! The last column of `vertical` and the last row of `horizontal` are the
//! outer border.
//!
//! Text layout: a `rows cols` header, `rows` lines of `0`/`1` tokens for
//! the vertical matrix, a blank line, then `rows` lines for the horizontal
//! matrix (`1` = wall).

use std::collections::VecDeque;
use std::str::FromStr;

use crate::error::MazeError;
use crate::matrix::Matrix;
use crate::occupancy::Direction;
use crate::{is_valid_size, Cell};

/// The two wall matrices describing a maze.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WallGrid {
    vertical: Matrix<bool>,
    horizontal: Matrix<bool>,
}

impl WallGrid {
    /// A `rows x cols` grid with every wall open, borders included.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            vertical: Matrix::new(rows, cols),
            horizontal: Matrix::new(rows, cols),
        }
    }

    /// Build from explicit matrices. Both must share one valid shape.
    pub fn from_matrices(
        vertical: Matrix<bool>,
        horizontal: Matrix<bool>,
    ) -> Result<Self, MazeError> {
        let (rows, cols) = (vertical.rows(), vertical.cols());
        if !is_valid_size(rows, cols) {
            return Err(MazeError::InvalidSize {
                rows: rows as i64,
                cols: cols as i64,
            });
        }
        if horizontal.rows() != rows || horizontal.cols() != cols {
            return Err(MazeError::invalid_data(
                0,
                format!(
                    "horizontal matrix is {}x{}, vertical is {}x{}",
                    horizontal.rows(),
                    horizontal.cols(),
                    rows,
                    cols
                ),
            ));
        }
        Ok(Self {
            vertical,
            horizontal,
        })
    }

    pub fn rows(&self) -> usize {
        self.vertical.rows()
    }

    pub fn cols(&self) -> usize {
        self.vertical.cols()
    }

    pub fn vertical(&self) -> &Matrix<bool> {
        &self.vertical
    }

    pub fn horizontal(&self) -> &Matrix<bool> {
        &self.horizontal
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows() && cell.col < self.cols()
    }

    pub fn has_right_wall(&self, cell: Cell) -> bool {
        self.vertical[(cell.row, cell.col)]
    }

    pub fn has_bottom_wall(&self, cell: Cell) -> bool {
        self.horizontal[(cell.row, cell.col)]
    }

    pub fn set_right_wall(&mut self, cell: Cell, wall: bool) {
        self.vertical[(cell.row, cell.col)] = wall;
    }

    pub fn set_bottom_wall(&mut self, cell: Cell, wall: bool) {
        self.horizontal[(cell.row, cell.col)] = wall;
    }

    /// Whether a move from `cell` in `direction` stays inside the maze
    /// and crosses no wall.
    pub fn is_open(&self, cell: Cell, direction: Direction) -> bool {
        if !self.contains(cell) {
            return false;
        }
        match direction {
            Direction::Left => cell.col > 0 && !self.has_right_wall(Cell::new(cell.row, cell.col - 1)),
            Direction::Up => cell.row > 0 && !self.has_bottom_wall(Cell::new(cell.row - 1, cell.col)),
            Direction::Right => cell.col + 1 < self.cols() && !self.has_right_wall(cell),
            Direction::Down => cell.row + 1 < self.rows() && !self.has_bottom_wall(cell),
        }
    }

    /// Number of openings between adjacent cells. Borders never count.
    pub fn open_edges(&self) -> usize {
        let (rows, cols) = (self.rows(), self.cols());
        let mut count = 0;
        for row in 0..rows {
            for col in 0..cols {
                let cell = Cell::new(row, col);
                if col + 1 < cols && !self.has_right_wall(cell) {
                    count += 1;
                }
                if row + 1 < rows && !self.has_bottom_wall(cell) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Number of cells reachable from `from` through openings.
    pub fn reachable_from(&self, from: Cell) -> usize {
        if !self.contains(from) {
            return 0;
        }
        let mut seen: Matrix<bool> = Matrix::new(self.rows(), self.cols());
        let mut queue = VecDeque::from([from]);
        seen[(from.row, from.col)] = true;
        let mut count = 0;

        while let Some(cell) = queue.pop_front() {
            count += 1;
            for direction in Direction::ALL {
                if !self.is_open(cell, direction) {
                    continue;
                }
                let next = direction.step_cell(cell);
                if !seen[(next.row, next.col)] {
                    seen[(next.row, next.col)] = true;
                    queue.push_back(next);
                }
            }
        }
        count
    }

    /// A perfect maze is a spanning tree over its cells: connected,
    /// with exactly `rows * cols - 1` openings.
    pub fn is_perfect(&self) -> bool {
        let cells = self.rows() * self.cols();
        cells > 0
            && self.open_edges() == cells - 1
            && self.reachable_from(Cell::new(0, 0)) == cells
    }

    /// Parse the text format.
    ///
    /// Blank lines are ignored. Sizes outside `1..=50` are `InvalidSize`;
    /// anything else that does not match the layout is `InvalidData`.
    pub fn parse(text: &str) -> Result<Self, MazeError> {
        let lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .collect();

        let (header_line, header) = *lines
            .first()
            .ok_or_else(|| MazeError::invalid_data(1, "missing size header"))?;
        let (rows, cols) = parse_header(header_line, header)?;

        let expected = 1 + 2 * rows;
        if lines.len() < expected {
            let line = lines.last().map_or(1, |(idx, _)| idx + 1);
            return Err(MazeError::invalid_data(
                line,
                format!("expected {} matrix lines, found {}", 2 * rows, lines.len() - 1),
            ));
        }
        if let Some((line, _)) = lines.get(expected) {
            return Err(MazeError::invalid_data(*line, "unexpected trailing data"));
        }

        let vertical = parse_block(&lines[1..=rows], cols)?;
        let horizontal = parse_block(&lines[rows + 1..expected], cols)?;
        Self::from_matrices(vertical, horizontal)
    }

    /// Serialize to the text format.
    pub fn to_text(&self) -> String {
        let mut out = format!("{} {}\n", self.rows(), self.cols());
        out.push_str(&block_to_text(&self.vertical));
        out.push_str("\n\n");
        out.push_str(&block_to_text(&self.horizontal));
        out
    }
}

impl FromStr for WallGrid {
    type Err = MazeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WallGrid::parse(s)
    }
}

fn parse_header(line: usize, header: &str) -> Result<(usize, usize), MazeError> {
    let mut tokens = header.split_whitespace();
    let mut dimension = || -> Result<i64, MazeError> {
        let token = tokens
            .next()
            .ok_or_else(|| MazeError::invalid_data(line, "header must be `rows cols`"))?;
        token
            .parse::<i64>()
            .map_err(|_| MazeError::invalid_data(line, format!("invalid dimension '{}'", token)))
    };
    let rows = dimension()?;
    let cols = dimension()?;
    if tokens.next().is_some() {
        return Err(MazeError::invalid_data(line, "header must be `rows cols`"));
    }

    match (usize::try_from(rows), usize::try_from(cols)) {
        (Ok(r), Ok(c)) if is_valid_size(r, c) => Ok((r, c)),
        _ => Err(MazeError::InvalidSize { rows, cols }),
    }
}

fn parse_block(lines: &[(usize, &str)], cols: usize) -> Result<Matrix<bool>, MazeError> {
    let mut matrix = Matrix::new(lines.len(), cols);
    for (row, (line, text)) in lines.iter().enumerate() {
        let mut tokens = text.split_whitespace();
        for col in 0..cols {
            matrix[(row, col)] = match tokens.next() {
                Some("0") => false,
                Some("1") => true,
                Some(other) => {
                    return Err(MazeError::invalid_data(
                        *line,
                        format!("unexpected token '{}'", other),
                    ))
                }
                None => {
                    return Err(MazeError::invalid_data(
                        *line,
                        format!("expected {} tokens, found {}", cols, col),
                    ))
                }
            };
        }
        if tokens.next().is_some() {
            return Err(MazeError::invalid_data(
                *line,
                format!("expected {} tokens", cols),
            ));
        }
    }
    Ok(matrix)
}

fn block_to_text(matrix: &Matrix<bool>) -> String {
    matrix
        .iter_rows()
        .map(|row| {
            row.iter()
                .map(|&wall| if wall { "1" } else { "0" })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    // 4x4 perfect maze; the only route from (0, 0) to (3, 3) is
    // right along row 0, down column 3 to row 2, then left and down.
    const MAZE_4X4: &str = "4 4\n\
        0 0 0 1\n\
        1 0 1 1\n\
        0 1 0 1\n\
        0 0 0 1\n\
        \n\
        1 0 1 0\n\
        0 0 1 0\n\
        1 1 0 1\n\
        1 1 1 1";

    #[test]
    fn test_parse_known_maze() {
        let walls = WallGrid::parse(MAZE_4X4).unwrap();
        assert_eq!(walls.rows(), 4);
        assert_eq!(walls.cols(), 4);
        assert!(walls.has_right_wall(Cell::new(1, 0)));
        assert!(!walls.has_right_wall(Cell::new(0, 0)));
        assert!(walls.has_bottom_wall(Cell::new(2, 3)));
        assert!(walls.is_perfect());
    }

    #[test]
    fn test_text_round_trip_is_byte_exact() {
        let walls = WallGrid::parse(MAZE_4X4).unwrap();
        let text = walls.to_text();
        assert_eq!(text, MAZE_4X4);
        assert_eq!(WallGrid::parse(&text).unwrap(), walls);
    }

    #[test]
    fn test_is_open_respects_walls_and_borders() {
        let walls = WallGrid::parse(MAZE_4X4).unwrap();
        let origin = Cell::new(0, 0);
        assert!(walls.is_open(origin, Direction::Right));
        assert!(!walls.is_open(origin, Direction::Down));
        assert!(!walls.is_open(origin, Direction::Left));
        assert!(!walls.is_open(origin, Direction::Up));
        assert!(walls.is_open(Cell::new(0, 3), Direction::Down));
        assert!(!walls.is_open(Cell::new(0, 3), Direction::Right));
    }

    #[test]
    fn test_cycle_is_not_perfect() {
        // Everything open: connected but full of cycles.
        let mut walls = WallGrid::new(3, 3);
        for row in 0..3 {
            walls.set_right_wall(Cell::new(row, 2), true);
            walls.set_bottom_wall(Cell::new(2, row), true);
        }
        assert_eq!(walls.reachable_from(Cell::new(0, 0)), 9);
        assert_eq!(walls.open_edges(), 12);
        assert!(!walls.is_perfect());
    }

    #[test]
    fn test_parse_size_out_of_range() {
        for text in ["0 5\n", "5 0\n", "-1 4\n", "51 3\n", "3 51\n"] {
            assert!(
                matches!(WallGrid::parse(text), Err(MazeError::InvalidSize { .. })),
                "{:?} should be rejected as a size error",
                text
            );
        }
    }

    #[test]
    fn test_parse_rejects_bad_token() {
        let text = "2 2\n0 1\n0 x\n\n0 0\n1 1";
        match WallGrid::parse(text) {
            Err(MazeError::InvalidData { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected InvalidData, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_missing_rows() {
        let text = "2 2\n0 1\n0 1\n\n0 0";
        assert!(matches!(
            WallGrid::parse(text),
            Err(MazeError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_short_and_long_lines() {
        assert!(WallGrid::parse("2 2\n0\n0 1\n\n0 0\n1 1").is_err());
        assert!(WallGrid::parse("2 2\n0 1 1\n0 1\n\n0 0\n1 1").is_err());
        assert!(WallGrid::parse("2 2\n0 1\n0 1\n\n0 0\n1 1\n1 1").is_err());
    }

    #[test]
    fn test_parse_rejects_garbage_header() {
        assert!(matches!(
            WallGrid::parse("two 2\n"),
            Err(MazeError::InvalidData { line: 1, .. })
        ));
        assert!(matches!(
            WallGrid::parse(""),
            Err(MazeError::InvalidData { .. })
        ));
    }
}
