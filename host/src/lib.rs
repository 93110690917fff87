use std::path::Path as FsPath;

use maze_core::verify::verify_path;
use maze_core::{
    astar, qlearning, Cell, Matrix, MazeError, Node, OccupancyGrid, PathError, SimpleLCG,
    WallGrid,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Search algorithm used to solve a maze
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Shortest path by A* - deterministic
    #[default]
    AStar,
    /// Tabular Q-learning - seeded, may fail to converge on large mazes
    QLearning,
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "astar" | "a*" => Ok(Algorithm::AStar),
            "qlearning" | "q-learning" => Ok(Algorithm::QLearning),
            _ => Err(format!("Invalid algorithm: '{}'. Must be 'astar' or 'qlearning'", s)),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::AStar => write!(f, "astar"),
            Algorithm::QLearning => write!(f, "qlearning"),
        }
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Maze(#[from] MazeError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A maze as plain data, for JSON files and HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MazeReport {
    pub rows: usize,
    pub cols: usize,

    /// Seed the maze was generated from; `None` for loaded mazes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,

    /// Wall to the right of each cell (1 = wall)
    pub vertical: Vec<Vec<u8>>,

    /// Wall below each cell (1 = wall)
    pub horizontal: Vec<Vec<u8>>,
}

impl MazeReport {
    pub fn from_walls(walls: &WallGrid, seed: Option<u32>) -> Self {
        Self {
            rows: walls.rows(),
            cols: walls.cols(),
            seed,
            vertical: matrix_to_rows(walls.vertical()),
            horizontal: matrix_to_rows(walls.horizontal()),
        }
    }

    /// Rebuild and validate the walls.
    pub fn to_walls(&self) -> Result<WallGrid, MazeError> {
        let vertical = rows_to_matrix(&self.vertical, self.rows, self.cols)?;
        let horizontal = rows_to_matrix(&self.horizontal, self.rows, self.cols)?;
        WallGrid::from_matrices(vertical, horizontal)
    }
}

fn matrix_to_rows(matrix: &Matrix<bool>) -> Vec<Vec<u8>> {
    matrix
        .iter_rows()
        .map(|row| row.iter().map(|&wall| u8::from(wall)).collect())
        .collect()
}

fn rows_to_matrix(rows: &[Vec<u8>], height: usize, width: usize) -> Result<Matrix<bool>, MazeError> {
    if rows.len() != height || rows.iter().any(|row| row.len() != width) {
        return Err(MazeError::InvalidData {
            line: 0,
            reason: format!("wall matrix is not {}x{}", height, width),
        });
    }

    let mut matrix = Matrix::new(height, width);
    for (r, row) in rows.iter().enumerate() {
        for (c, &token) in row.iter().enumerate() {
            matrix[(r, c)] = match token {
                0 => false,
                1 => true,
                other => {
                    return Err(MazeError::InvalidData {
                        line: r + 1,
                        reason: format!("unexpected wall value {}", other),
                    })
                }
            };
        }
    }
    Ok(matrix)
}

/// Outcome of one search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathReport {
    pub algorithm: Algorithm,

    /// Exploration seed, Q-learning only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,

    pub start: Cell,
    pub goal: Cell,

    /// Logical cells visited, start to goal
    pub cells: Vec<Cell>,

    /// Occupancy-grid nodes, gates included, start to goal
    pub nodes: Vec<Node>,

    /// Unit moves on the occupancy grid
    pub steps: usize,

    /// Whether the path checks out against the maze it was found in
    pub is_valid: bool,
}

/// Generate a perfect maze from a seed.
///
/// # Example
/// ```
/// let report = host::generate_maze(10, 12, 2918957128).unwrap();
/// assert_eq!((report.rows, report.cols), (10, 12));
/// ```
pub fn generate_maze(rows: usize, cols: usize, seed: u32) -> Result<MazeReport, HostError> {
    tracing::info!("Generating {}x{} maze from seed {}", rows, cols, seed);

    let mut maze = maze_core::Maze::new();
    let walls = maze.generate(rows, cols, &mut SimpleLCG::new(seed))?;

    tracing::info!("Maze generated ({} openings)", walls.open_edges());
    Ok(MazeReport::from_walls(walls, Some(seed)))
}

/// A fresh seed for callers that did not supply one.
///
/// Only the seed is random; the run itself still goes through [`SimpleLCG`],
/// so reporting the seed is enough to reproduce it.
pub fn random_seed() -> u32 {
    rand::random::<u32>()
}

/// Load a maze from the text format.
pub fn load_maze(path: impl AsRef<FsPath>) -> Result<MazeReport, HostError> {
    let path = path.as_ref();
    tracing::info!("Loading maze from {}", path.display());

    let mut maze = maze_core::Maze::new();
    let walls = maze.load(path)?;
    Ok(MazeReport::from_walls(walls, None))
}

/// Save a maze in the text format.
pub fn save_maze(report: &MazeReport, path: impl AsRef<FsPath>) -> Result<(), HostError> {
    let path = path.as_ref();
    let walls = report.to_walls()?;
    std::fs::write(path, walls.to_text())?;

    tracing::info!("Saved {}x{} maze to {}", report.rows, report.cols, path.display());
    Ok(())
}

/// Solve `walls` from `start` to `goal`.
///
/// `seed` drives Q-learning exploration and is ignored by A*.
pub fn solve(
    walls: &WallGrid,
    algorithm: Algorithm,
    start: Cell,
    goal: Cell,
    seed: u32,
) -> Result<PathReport, HostError> {
    tracing::info!("Solving {} -> {} with {}", start, goal, algorithm);

    let grid = OccupancyGrid::from_walls(walls);
    let (path, seed) = match algorithm {
        Algorithm::AStar => (astar::find_path(&grid, start, goal)?, None),
        Algorithm::QLearning => {
            let mut rng = SimpleLCG::new(seed);
            (qlearning::find_path(&grid, start, goal, &mut rng)?, Some(seed))
        }
    };

    let is_valid = verify_path(&grid, path.nodes(), start.to_node(), goal.to_node());
    tracing::info!("Path found: {} steps, valid: {}", path.steps(), is_valid);

    Ok(PathReport {
        algorithm,
        seed,
        start,
        goal,
        cells: path.cells(),
        nodes: path.nodes().to_vec(),
        steps: path.steps(),
        is_valid,
    })
}

/// Re-check a stored path against a maze.
pub fn verify_report(walls: &WallGrid, report: &PathReport) -> bool {
    let grid = OccupancyGrid::from_walls(walls);
    let valid = verify_path(&grid, &report.nodes, report.start.to_node(), report.goal.to_node());

    tracing::info!("Verified {} node path: {}", report.nodes.len(), valid);
    valid
}

pub fn save_json<T: Serialize>(value: &T, path: impl AsRef<FsPath>) -> Result<(), HostError> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: impl AsRef<FsPath>) -> Result<T, HostError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
