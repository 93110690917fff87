//! Endpoint selection and search coordination.
//!
//! [`PathFinder`] owns the occupancy grid of the current maze, the chosen
//! start and end cells, and the last path found. Selecting the second
//! endpoint (or changing one while both are set) runs A* immediately; a
//! failed search rolls the changed endpoint back, so the finder is always
//! in its last valid state.

use crate::astar;
use crate::error::PathError;
use crate::occupancy::{OccupancyGrid, Path};
use crate::qlearning::{QLearner, QLearningConfig};
use crate::rng::RandomSource;
use crate::Cell;

/// Size of the drawing surface the pixel coordinates refer to.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A point on the drawing surface, origin top left.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Endpoint {
    Start,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SelectionState {
    NoEndpoints,
    StartOnly,
    EndOnly,
    BothSet,
}

#[derive(Clone, Debug)]
pub struct PathFinder {
    grid: OccupancyGrid,
    start: Option<Cell>,
    end: Option<Cell>,
    path: Option<Path>,
    learning: QLearningConfig,
}

impl PathFinder {
    pub fn new(grid: OccupancyGrid) -> Self {
        Self {
            grid,
            start: None,
            end: None,
            path: None,
            learning: QLearningConfig::default(),
        }
    }

    /// Replace the grid. Endpoints and path belong to the old maze and are cleared.
    pub fn set_grid(&mut self, grid: OccupancyGrid) {
        self.grid = grid;
        self.reset();
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn start(&self) -> Option<Cell> {
        self.start
    }

    pub fn end(&self) -> Option<Cell> {
        self.end
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    pub fn learning_config(&self) -> &QLearningConfig {
        &self.learning
    }

    pub fn set_learning_config(&mut self, config: QLearningConfig) {
        self.learning = config;
    }

    pub fn state(&self) -> SelectionState {
        match (self.start, self.end) {
            (None, None) => SelectionState::NoEndpoints,
            (Some(_), None) => SelectionState::StartOnly,
            (None, Some(_)) => SelectionState::EndOnly,
            (Some(_), Some(_)) => SelectionState::BothSet,
        }
    }

    /// Map a pixel to the logical cell under it.
    ///
    /// `Ok(None)` for points with a non-positive or NaN coordinate (nothing
    /// selected); `OutOfBounds` for points past the viewport edge. A point
    /// exactly on the right or bottom edge belongs to the last column or row.
    pub fn cell_at(&self, point: PixelPoint, viewport: Viewport) -> Result<Option<Cell>, PathError> {
        if !(point.x > 0.0 && point.y > 0.0 && viewport.width > 0.0 && viewport.height > 0.0) {
            return Ok(None);
        }

        let rows = self.grid.logical_rows();
        let cols = self.grid.logical_cols();
        let cell = Cell::new(
            (point.y / (viewport.height / rows as f32)).floor() as usize,
            (point.x / (viewport.width / cols as f32)).floor() as usize,
        );

        if point.x > viewport.width || point.y > viewport.height {
            return Err(PathError::OutOfBounds {
                row: cell.row,
                col: cell.col,
            });
        }
        Ok(Some(Cell::new(cell.row.min(rows - 1), cell.col.min(cols - 1))))
    }

    /// Select the start cell by pixel. Returns whether anything changed.
    pub fn set_start(&mut self, point: PixelPoint, viewport: Viewport) -> Result<bool, PathError> {
        self.set_endpoint(Endpoint::Start, point, viewport)
    }

    /// Select the end cell by pixel. Returns whether anything changed.
    pub fn set_end(&mut self, point: PixelPoint, viewport: Viewport) -> Result<bool, PathError> {
        self.set_endpoint(Endpoint::End, point, viewport)
    }

    pub fn set_endpoint(
        &mut self,
        endpoint: Endpoint,
        point: PixelPoint,
        viewport: Viewport,
    ) -> Result<bool, PathError> {
        match self.cell_at(point, viewport)? {
            Some(cell) => self.select(endpoint, cell),
            None => Ok(false),
        }
    }

    /// Select an endpoint by logical cell.
    ///
    /// Re-selecting the stored cell is a no-op. When both endpoints end
    /// up set, A* runs; if it fails the endpoint keeps its old value and
    /// the error is returned.
    pub fn select(&mut self, endpoint: Endpoint, cell: Cell) -> Result<bool, PathError> {
        if !self.grid.contains_cell(cell) {
            return Err(PathError::OutOfBounds {
                row: cell.row,
                col: cell.col,
            });
        }

        let slot = match endpoint {
            Endpoint::Start => &mut self.start,
            Endpoint::End => &mut self.end,
        };
        if *slot == Some(cell) {
            return Ok(false);
        }
        let previous = slot.replace(cell);

        if let (Some(start), Some(end)) = (self.start, self.end) {
            match astar::find_path(&self.grid, start, end) {
                Ok(path) => {
                    tracing::debug!(%start, %end, steps = path.steps(), "A* path updated");
                    self.path = Some(path);
                }
                Err(err) => {
                    tracing::warn!(%start, %end, error = %err, "A* failed, endpoint restored");
                    match endpoint {
                        Endpoint::Start => self.start = previous,
                        Endpoint::End => self.end = previous,
                    }
                    return Err(err);
                }
            }
        }

        Ok(true)
    }

    /// Search with Q-learning and, on success only, adopt `start`, `goal`
    /// and the learned path.
    pub fn find_by_learning<R: RandomSource>(
        &mut self,
        start: Cell,
        goal: Cell,
        rng: &mut R,
    ) -> Result<&Path, PathError> {
        let learner = QLearner::with_config(&self.grid, self.learning.clone());
        tracing::debug!(%start, %goal, episodes = learner.episodes(), "Q-learning search");

        let path = learner.find_path(start, goal, rng)?;
        self.start = Some(start);
        self.end = Some(goal);
        Ok(&*self.path.insert(path))
    }

    /// Back to no endpoints and no path.
    pub fn reset(&mut self) {
        self.start = None;
        self.end = None;
        self.path = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SimpleLCG;
    use crate::walls::WallGrid;

    const MAZE_4X4: &str = "4 4\n0 0 0 1\n1 0 1 1\n0 1 0 1\n0 0 0 1\n\n1 0 1 0\n0 0 1 0\n1 1 0 1\n1 1 1 1";
    const ISOLATED: &str = "4 4\n0 1 0 1\n0 1 0 1\n0 1 0 1\n0 1 0 1\n\n0 0 0 0\n0 0 0 0\n0 0 0 0\n1 1 1 1";
    const VIEW: Viewport = Viewport::new(500.0, 500.0);

    fn finder(text: &str) -> PathFinder {
        PathFinder::new(OccupancyGrid::from_walls(&WallGrid::parse(text).unwrap()))
    }

    #[test]
    fn test_pixel_to_cell() {
        let finder = finder(MAZE_4X4);
        assert_eq!(finder.cell_at(PixelPoint::new(10.0, 10.0), VIEW), Ok(Some(Cell::new(0, 0))));
        assert_eq!(finder.cell_at(PixelPoint::new(480.0, 480.0), VIEW), Ok(Some(Cell::new(3, 3))));
        // x picks the column, y the row
        assert_eq!(finder.cell_at(PixelPoint::new(130.0, 260.0), VIEW), Ok(Some(Cell::new(2, 1))));
        assert_eq!(finder.cell_at(PixelPoint::new(0.0, 10.0), VIEW), Ok(None));
        assert_eq!(finder.cell_at(PixelPoint::new(-5.0, 10.0), VIEW), Ok(None));
        assert_eq!(
            finder.cell_at(PixelPoint::new(600.0, 10.0), VIEW),
            Err(PathError::OutOfBounds { row: 0, col: 4 })
        );
    }

    #[test]
    fn test_pixel_edges_and_nan() {
        let finder = finder(MAZE_4X4);
        assert_eq!(finder.cell_at(PixelPoint::new(500.0, 500.0), VIEW), Ok(Some(Cell::new(3, 3))));
        assert_eq!(finder.cell_at(PixelPoint::new(500.0, 10.0), VIEW), Ok(Some(Cell::new(0, 3))));
        assert_eq!(
            finder.cell_at(PixelPoint::new(10.0, 500.5), VIEW),
            Err(PathError::OutOfBounds { row: 4, col: 0 })
        );

        assert_eq!(finder.cell_at(PixelPoint::new(f32::NAN, 10.0), VIEW), Ok(None));
        assert_eq!(finder.cell_at(PixelPoint::new(10.0, f32::NAN), VIEW), Ok(None));
        assert_eq!(finder.cell_at(PixelPoint::new(10.0, 10.0), Viewport::new(f32::NAN, 500.0)), Ok(None));

        let mut finder = finder;
        assert_eq!(finder.set_start(PixelPoint::new(f32::NAN, f32::NAN), VIEW), Ok(false));
        assert_eq!(finder.start(), None);
    }

    #[test]
    fn test_selection_runs_astar() {
        let mut finder = finder(MAZE_4X4);
        assert_eq!(finder.state(), SelectionState::NoEndpoints);

        assert_eq!(finder.set_start(PixelPoint::new(10.0, 10.0), VIEW), Ok(true));
        assert_eq!(finder.state(), SelectionState::StartOnly);
        assert!(finder.path().is_none());

        assert_eq!(finder.set_end(PixelPoint::new(480.0, 480.0), VIEW), Ok(true));
        assert_eq!(finder.state(), SelectionState::BothSet);
        let path = finder.path().unwrap();
        assert_eq!(path.steps(), 16);
        assert_eq!(path.start(), Some(Cell::new(0, 0).to_node()));

        // Same cell again changes nothing
        assert_eq!(finder.set_end(PixelPoint::new(490.0, 470.0), VIEW), Ok(false));

        assert_eq!(finder.select(Endpoint::Start, Cell::new(3, 2)), Ok(true));
        assert_eq!(finder.path().unwrap().steps(), 2);
    }

    #[test]
    fn test_end_only_then_start() {
        let mut finder = finder(MAZE_4X4);
        finder.select(Endpoint::End, Cell::new(1, 1)).unwrap();
        assert_eq!(finder.state(), SelectionState::EndOnly);
        finder.select(Endpoint::Start, Cell::new(0, 0)).unwrap();
        assert_eq!(finder.path().unwrap().cells(), vec![Cell::new(0, 0), Cell::new(0, 1), Cell::new(1, 1)]);
    }

    #[test]
    fn test_failed_search_rolls_back() {
        let mut finder = finder(ISOLATED);
        finder.select(Endpoint::Start, Cell::new(0, 0)).unwrap();
        finder.select(Endpoint::End, Cell::new(3, 1)).unwrap();
        let before = finder.path().cloned();

        assert_eq!(finder.select(Endpoint::End, Cell::new(3, 3)), Err(PathError::NoPath));
        assert_eq!(finder.end(), Some(Cell::new(3, 1)));
        assert_eq!(finder.path().cloned(), before);

        assert_eq!(
            finder.set_start(PixelPoint::new(400.0, 10.0), VIEW),
            Err(PathError::NoPath)
        );
        assert_eq!(finder.start(), Some(Cell::new(0, 0)));
    }

    #[test]
    fn test_out_of_bounds_select() {
        let mut finder = finder(MAZE_4X4);
        assert_eq!(
            finder.select(Endpoint::Start, Cell::new(4, 0)),
            Err(PathError::OutOfBounds { row: 4, col: 0 })
        );
        assert_eq!(finder.start(), None);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut finder = finder(MAZE_4X4);
        finder.select(Endpoint::Start, Cell::new(0, 0)).unwrap();
        finder.select(Endpoint::End, Cell::new(3, 3)).unwrap();

        finder.reset();
        assert_eq!(finder.state(), SelectionState::NoEndpoints);
        assert!(finder.path().is_none());

        finder.reset();
        assert_eq!(finder.state(), SelectionState::NoEndpoints);
        assert!(finder.path().is_none());
    }

    #[test]
    fn test_learning_commits_only_on_success() {
        let mut finder = finder(MAZE_4X4);
        finder.select(Endpoint::Start, Cell::new(0, 0)).unwrap();
        finder.select(Endpoint::End, Cell::new(0, 2)).unwrap();
        let before = finder.path().cloned();

        finder.set_learning_config(QLearningConfig {
            episodes: Some(1),
            ..QLearningConfig::default()
        });
        let result = finder.find_by_learning(Cell::new(0, 0), Cell::new(3, 3), &mut SimpleLCG::new(5));
        assert!(matches!(result, Err(PathError::Incomplete { .. })));
        assert_eq!(finder.end(), Some(Cell::new(0, 2)));
        assert_eq!(finder.path().cloned(), before);

        finder.set_learning_config(QLearningConfig {
            episodes: Some(2000),
            ..QLearningConfig::default()
        });
        let path = finder
            .find_by_learning(Cell::new(0, 0), Cell::new(0, 3), &mut SimpleLCG::new(5))
            .unwrap()
            .clone();
        assert_eq!(path.steps(), 6);
        assert_eq!(finder.end(), Some(Cell::new(0, 3)));
        assert_eq!(finder.path(), Some(&path));
    }

    #[test]
    fn test_set_grid_clears_selection() {
        let mut finder = finder(MAZE_4X4);
        finder.select(Endpoint::Start, Cell::new(0, 0)).unwrap();
        finder.set_grid(OccupancyGrid::from_walls(&WallGrid::parse(ISOLATED).unwrap()));
        assert_eq!(finder.state(), SelectionState::NoEndpoints);
    }
}
