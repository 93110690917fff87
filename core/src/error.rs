//! Error types for maze construction, persistence and path search.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of validation, parsing and I/O.
///
/// All of these are recoverable; a failed operation leaves the maze
/// either untouched (validation) or cleared (malformed data).
#[derive(Debug, Error)]
pub enum MazeError {
    #[error("Incorrect maze size: {rows}x{cols}")]
    InvalidSize { rows: i64, cols: i64 },

    #[error("Invalid maze data at line {line}: {reason}")]
    InvalidData { line: usize, reason: String },

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No maze loaded")]
    NoMaze,

    #[error(transparent)]
    Path(#[from] PathError),
}

impl MazeError {
    pub(crate) fn invalid_data(line: usize, reason: impl Into<String>) -> Self {
        MazeError::InvalidData {
            line,
            reason: reason.into(),
        }
    }
}

/// Outcomes of a search that did not produce a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A* exhausted its frontier: the endpoints are in disconnected regions.
    #[error("Path not found. Probably the labyrinth has isolated study areas")]
    NoPath,

    /// The greedy walk over a learned Q-table never reached the goal.
    #[error("Learned policy did not reach the goal after {steps} steps")]
    Incomplete { steps: usize },

    #[error("Cell ({row}, {col}) is outside the maze")]
    OutOfBounds { row: usize, col: usize },
}
