//! The maze entity: walls, persistence and the path finder.

use std::fs;
use std::io;
use std::path::{Path as FsPath, PathBuf};

use crate::error::MazeError;
use crate::maze_gen;
use crate::occupancy::{OccupancyGrid, Path};
use crate::pathfinder::{Endpoint, PathFinder, PixelPoint, Viewport};
use crate::rng::RandomSource;
use crate::walls::WallGrid;
use crate::{is_valid_size, Cell};

/// A maze and its search state.
///
/// Starts empty. Generating or loading installs a [`WallGrid`] and hands
/// the derived [`OccupancyGrid`] to a [`PathFinder`]; everything that needs
/// a maze returns [`MazeError::NoMaze`] until then.
#[derive(Debug, Default)]
pub struct Maze {
    walls: Option<WallGrid>,
    finder: Option<PathFinder>,
    generated: usize,
}

impl Maze {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a maze from existing walls.
    pub fn from_walls(walls: WallGrid) -> Self {
        let mut maze = Self::new();
        maze.install(walls);
        maze
    }

    pub fn walls(&self) -> Option<&WallGrid> {
        self.walls.as_ref()
    }

    /// `(rows, cols)` of the current maze.
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.walls.as_ref().map(|walls| (walls.rows(), walls.cols()))
    }

    pub fn is_empty(&self) -> bool {
        self.walls.is_none()
    }

    pub fn path_finder(&self) -> Option<&PathFinder> {
        self.finder.as_ref()
    }

    pub fn path_finder_mut(&mut self) -> Option<&mut PathFinder> {
        self.finder.as_mut()
    }

    fn finder_mut(&mut self) -> Result<&mut PathFinder, MazeError> {
        self.finder.as_mut().ok_or(MazeError::NoMaze)
    }

    fn install(&mut self, walls: WallGrid) {
        let grid = OccupancyGrid::from_walls(&walls);
        match self.finder.as_mut() {
            Some(finder) => finder.set_grid(grid),
            None => self.finder = Some(PathFinder::new(grid)),
        }
        self.walls = Some(walls);
    }

    /// Drop walls, grid and selection.
    pub fn clear(&mut self) {
        self.walls = None;
        self.finder = None;
    }

    /// Generate a new perfect maze. Invalid sizes leave the current maze as it was.
    pub fn generate<R: RandomSource>(
        &mut self,
        rows: usize,
        cols: usize,
        rng: &mut R,
    ) -> Result<&WallGrid, MazeError> {
        if !is_valid_size(rows, cols) {
            return Err(MazeError::InvalidSize {
                rows: rows as i64,
                cols: cols as i64,
            });
        }

        self.install(maze_gen::generate(rows, cols, rng));
        self.walls.as_ref().ok_or(MazeError::NoMaze)
    }

    /// Parse maze text. The maze is cleared when the text is malformed.
    pub fn load_str(&mut self, text: &str) -> Result<&WallGrid, MazeError> {
        match WallGrid::parse(text) {
            Ok(walls) => {
                self.install(walls);
                self.walls.as_ref().ok_or(MazeError::NoMaze)
            }
            Err(err) => {
                self.clear();
                Err(err)
            }
        }
    }

    /// Load a maze file. A missing file is [`MazeError::FileNotFound`] and
    /// leaves the current maze alone; unreadable or malformed files clear it.
    pub fn load(&mut self, path: impl AsRef<FsPath>) -> Result<&WallGrid, MazeError> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(MazeError::FileNotFound(path.to_path_buf()));
            }
            Err(err) => {
                self.clear();
                return Err(err.into());
            }
        };

        tracing::debug!(path = %path.display(), bytes = text.len(), "loading maze");
        self.load_str(&text)
    }

    /// Write the current maze in the text format.
    pub fn save(&self, path: impl AsRef<FsPath>) -> Result<(), MazeError> {
        let walls = self.walls.as_ref().ok_or(MazeError::NoMaze)?;
        fs::write(path, walls.to_text())?;
        Ok(())
    }

    /// Write the current maze as `maze_<n>.txt` in `dir`, numbering from 0
    /// for each `Maze`. The directory is created when missing.
    pub fn save_generated(&mut self, dir: impl AsRef<FsPath>) -> Result<PathBuf, MazeError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let file = dir.join(format!("maze_{}.txt", self.generated));
        self.save(&file)?;
        self.generated += 1;
        Ok(file)
    }

    pub fn set_start(&mut self, point: PixelPoint, viewport: Viewport) -> Result<bool, MazeError> {
        Ok(self.finder_mut()?.set_start(point, viewport)?)
    }

    pub fn set_end(&mut self, point: PixelPoint, viewport: Viewport) -> Result<bool, MazeError> {
        Ok(self.finder_mut()?.set_end(point, viewport)?)
    }

    pub fn select(&mut self, endpoint: Endpoint, cell: Cell) -> Result<bool, MazeError> {
        Ok(self.finder_mut()?.select(endpoint, cell)?)
    }

    pub fn find_by_learning<R: RandomSource>(
        &mut self,
        start: Cell,
        goal: Cell,
        rng: &mut R,
    ) -> Result<&Path, MazeError> {
        Ok(self.finder_mut()?.find_by_learning(start, goal, rng)?)
    }

    /// Clear endpoints and path, keeping the maze.
    pub fn reset_path(&mut self) {
        if let Some(finder) = self.finder.as_mut() {
            finder.reset();
        }
    }

    /// The last path found, if any.
    pub fn path(&self) -> Option<&Path> {
        self.finder.as_ref().and_then(PathFinder::path)
    }
}
