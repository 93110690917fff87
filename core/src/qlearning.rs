//! Tabular Q-learning over the occupancy grid.
//!
//! States are occupancy-grid nodes, actions are the four [`Direction`]s.
//! Rewards:
//! - `+10`, terminal: the move lands on the goal
//! - `-10`, terminal: the move hits a wall or leaves the grid; the agent
//!   stays where it was
//! - `-0.1` otherwise
//!
//! Training runs ε-greedy episodes from the start with the one-step update
//! `Q(s,a) += α (r + γ max Q(s',·) - Q(s,a))` and `ε(e) = ε₀ exp(-decay e)`.
//! The path is then read off greedily from the table. A fresh table is
//! built for every search and dropped afterwards.

use std::collections::{HashMap, HashSet};

use crate::error::PathError;
use crate::occupancy::{reconstruct_path, Direction, Node, OccupancyGrid, Path};
use crate::rng::RandomSource;
use crate::verify::verify_path;
use crate::Cell;

pub const GOAL_REWARD: f32 = 10.0;
pub const WALL_REWARD: f32 = -10.0;
pub const STEP_REWARD: f32 = -0.1;

/// Upper bound on greedy steps when reading a path out of the table.
pub const WALK_LIMIT: usize = 5_000_000;

/// Training episodes for a maze whose larger side is `n` logical cells.
///
/// `n <= 30`: `n * 155`; `30 < n <= 40`: `n * 200`; `n > 40`: `n * 200 + 500`.
pub fn episode_count(n: usize) -> usize {
    if n <= 30 {
        n * 155
    } else if n > 40 {
        n * 200 + 500
    } else {
        n * 200
    }
}

/// Hyperparameters of one Q-learning search.
#[derive(Clone, Debug, PartialEq)]
pub struct QLearningConfig {
    /// Learning rate
    pub alpha: f32,
    /// Discount factor
    pub gamma: f32,
    pub epsilon_start: f32,
    /// Per-episode exponential decay of ε
    pub epsilon_decay: f32,
    /// Fixed episode count; `None` uses [`episode_count`].
    pub episodes: Option<usize>,
    /// Steps after which a training episode is abandoned.
    /// `None` means 64 steps per grid node.
    pub episode_step_limit: Option<usize>,
    /// Greedy extraction cap
    pub walk_limit: usize,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            alpha: 0.9,
            gamma: 0.98,
            epsilon_start: 1.0,
            epsilon_decay: 0.01,
            episodes: None,
            episode_step_limit: None,
            walk_limit: WALK_LIMIT,
        }
    }
}

impl QLearningConfig {
    pub fn epsilon(&self, episode: usize) -> f32 {
        self.epsilon_start * (-self.epsilon_decay * episode as f32).exp()
    }
}

/// Learned action values, one `[left, up, right, down]` entry per node.
#[derive(Clone, Debug)]
pub struct QTable {
    values: Vec<[f32; 4]>,
    cols: usize,
}

impl QTable {
    pub fn new(grid: &OccupancyGrid) -> Self {
        Self {
            values: vec![[0.0; 4]; grid.len()],
            cols: grid.cols(),
        }
    }

    pub fn values(&self, node: Node) -> &[f32; 4] {
        &self.values[node.row * self.cols + node.col]
    }

    fn values_mut(&mut self, node: Node) -> &mut [f32; 4] {
        &mut self.values[node.row * self.cols + node.col]
    }

    /// Highest-valued action; ties go to the first in left, up, right, down.
    pub fn best_action(&self, node: Node) -> Direction {
        let values = self.values(node);
        let mut best = 0;
        for index in 1..values.len() {
            if values[index] > values[best] {
                best = index;
            }
        }
        Direction::ALL[best]
    }

    pub fn max_value(&self, node: Node) -> f32 {
        self.values(node)
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max)
    }
}

/// Outcome of one simulated move.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Transition {
    next: Node,
    reward: f32,
    done: bool,
}

/// Q-learning search bound to one occupancy grid.
pub struct QLearner<'g> {
    grid: &'g OccupancyGrid,
    config: QLearningConfig,
}

impl<'g> QLearner<'g> {
    pub fn new(grid: &'g OccupancyGrid) -> Self {
        Self::with_config(grid, QLearningConfig::default())
    }

    pub fn with_config(grid: &'g OccupancyGrid, config: QLearningConfig) -> Self {
        Self { grid, config }
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    /// Episodes this learner will run on its grid.
    pub fn episodes(&self) -> usize {
        self.config.episodes.unwrap_or_else(|| {
            episode_count(self.grid.logical_rows().max(self.grid.logical_cols()))
        })
    }

    fn episode_step_limit(&self) -> usize {
        self.config
            .episode_step_limit
            .unwrap_or_else(|| self.grid.len().saturating_mul(64))
    }

    fn transition(&self, state: Node, action: Direction, goal: Node) -> Transition {
        match state.step(action) {
            Some(next) if next == goal => Transition {
                next,
                reward: GOAL_REWARD,
                done: true,
            },
            Some(next) if self.grid.is_passable(next) => Transition {
                next,
                reward: STEP_REWARD,
                done: false,
            },
            _ => Transition {
                next: state,
                reward: WALL_REWARD,
                done: true,
            },
        }
    }

    fn select_action<R: RandomSource>(
        &self,
        table: &QTable,
        state: Node,
        epsilon: f32,
        rng: &mut R,
    ) -> Direction {
        if rng.next_f32() < epsilon {
            Direction::ALL[rng.choice_index(Direction::ALL.len())]
        } else {
            table.best_action(state)
        }
    }

    fn update(&self, table: &mut QTable, state: Node, action: Direction, transition: Transition) {
        let max_next = table.max_value(transition.next);
        let value = &mut table.values_mut(state)[action.index()];
        let target = transition.reward + self.config.gamma * max_next;
        *value += self.config.alpha * (target - *value);
    }

    /// Train a fresh table for the `start` -> `goal` task.
    pub fn train<R: RandomSource>(&self, start: Node, goal: Node, rng: &mut R) -> QTable {
        let mut table = QTable::new(self.grid);
        let episodes = self.episodes();
        let step_limit = self.episode_step_limit();
        let mut reached_goal = 0usize;

        tracing::debug!(episodes, step_limit, "Q-learning training started");

        for episode in 0..episodes {
            let epsilon = self.config.epsilon(episode);
            let mut state = start;

            for _ in 0..step_limit {
                let action = self.select_action(&table, state, epsilon, rng);
                let transition = self.transition(state, action, goal);
                self.update(&mut table, state, action, transition);
                state = transition.next;

                if transition.done {
                    if transition.next == goal {
                        reached_goal += 1;
                    }
                    break;
                }
            }
        }

        tracing::debug!(episodes, reached_goal, "Q-learning training finished");
        table
    }

    /// Follow the greedy policy from `start` and rebuild the walk.
    ///
    /// The policy is deterministic, so revisiting a node means it loops
    /// forever; that, a wall hit, or the walk limit all end in
    /// [`PathError::Incomplete`].
    pub fn greedy_path(&self, table: &QTable, start: Node, goal: Node) -> Result<Path, PathError> {
        let mut parents: HashMap<Node, Node> = HashMap::new();
        let mut visited: HashSet<Node> = HashSet::from([start]);
        let mut current = start;
        let mut steps = 0;

        while current != goal {
            if steps >= self.config.walk_limit {
                tracing::warn!(steps, "greedy walk hit the step limit");
                return Err(PathError::Incomplete { steps });
            }

            let next = match current.step(table.best_action(current)) {
                Some(next) if self.grid.is_passable(next) => next,
                _ => return Err(PathError::Incomplete { steps }),
            };
            if !visited.insert(next) {
                return Err(PathError::Incomplete { steps });
            }

            parents.insert(next, current);
            current = next;
            steps += 1;
        }

        let path = reconstruct_path(&parents, start, goal).ok_or(PathError::Incomplete { steps })?;
        if !verify_path(self.grid, path.nodes(), start, goal) {
            return Err(PathError::Incomplete { steps });
        }
        Ok(path)
    }

    /// Train and extract a path between two logical cells.
    pub fn find_path<R: RandomSource>(
        &self,
        start: Cell,
        goal: Cell,
        rng: &mut R,
    ) -> Result<Path, PathError> {
        for cell in [start, goal] {
            if !self.grid.contains_cell(cell) {
                return Err(PathError::OutOfBounds {
                    row: cell.row,
                    col: cell.col,
                });
            }
        }

        let (start, goal) = (start.to_node(), goal.to_node());
        if start == goal {
            return Ok(Path::new(vec![start]));
        }

        let table = self.train(start, goal, rng);
        self.greedy_path(&table, start, goal)
    }
}

/// Q-learning search with default parameters.
pub fn find_path<R: RandomSource>(
    grid: &OccupancyGrid,
    start: Cell,
    goal: Cell,
    rng: &mut R,
) -> Result<Path, PathError> {
    QLearner::new(grid).find_path(start, goal, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astar;
    use crate::rng::SimpleLCG;
    use crate::walls::WallGrid;

    const MAZE_4X4: &str = "4 4\n0 0 0 1\n1 0 1 1\n0 1 0 1\n0 0 0 1\n\n1 0 1 0\n0 0 1 0\n1 1 0 1\n1 1 1 1";

    fn grid() -> OccupancyGrid {
        OccupancyGrid::from_walls(&WallGrid::parse(MAZE_4X4).unwrap())
    }

    #[test]
    fn test_episode_count_boundaries() {
        assert_eq!(episode_count(3), 465);
        assert_eq!(episode_count(4), 620);
        assert_eq!(episode_count(30), 4650);
        assert_eq!(episode_count(31), 6200);
        assert_eq!(episode_count(40), 8000);
        assert_eq!(episode_count(41), 8700);
        assert_eq!(episode_count(50), 10500);
    }

    #[test]
    fn test_epsilon_decay() {
        let config = QLearningConfig::default();
        assert_eq!(config.epsilon(0), 1.0);
        assert!((config.epsilon(100) - (-1.0f32).exp()).abs() < 1e-6);
        assert!(config.epsilon(500) < 0.01);
    }

    #[test]
    fn test_rewards() {
        let grid = grid();
        let learner = QLearner::new(&grid);
        let goal = Node::new(0, 2);

        let wall = learner.transition(Node::new(0, 0), Direction::Down, goal);
        assert_eq!(wall, Transition { next: Node::new(0, 0), reward: WALL_REWARD, done: true });

        let edge = learner.transition(Node::new(0, 0), Direction::Left, goal);
        assert_eq!(edge.next, Node::new(0, 0));
        assert!(edge.done);

        let step = learner.transition(Node::new(0, 0), Direction::Right, goal);
        assert_eq!(step, Transition { next: Node::new(0, 1), reward: STEP_REWARD, done: false });

        let arrive = learner.transition(Node::new(0, 1), Direction::Right, goal);
        assert_eq!(arrive, Transition { next: goal, reward: GOAL_REWARD, done: true });
    }

    #[test]
    fn test_best_action_prefers_first_on_ties() {
        let grid = grid();
        let mut table = QTable::new(&grid);
        assert_eq!(table.best_action(Node::new(0, 0)), Direction::Left);

        *table.values_mut(Node::new(0, 0)) = [-1.0, 2.0, 2.0, 0.0];
        assert_eq!(table.best_action(Node::new(0, 0)), Direction::Up);
        assert_eq!(table.max_value(Node::new(0, 0)), 2.0);
    }

    #[test]
    fn test_update_rule() {
        let grid = grid();
        let learner = QLearner::new(&grid);
        let mut table = QTable::new(&grid);
        *table.values_mut(Node::new(0, 1)) = [0.0, 0.0, 5.0, 0.0];

        let transition = learner.transition(Node::new(0, 0), Direction::Right, Node::new(6, 6));
        learner.update(&mut table, Node::new(0, 0), Direction::Right, transition);

        let expected = 0.9 * (STEP_REWARD + 0.98 * 5.0);
        assert!((table.values(Node::new(0, 0))[2] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_greedy_walk_on_untrained_table_is_incomplete() {
        let grid = grid();
        let learner = QLearner::new(&grid);
        let table = QTable::new(&grid);
        // All zeros: greedy picks Left from the corner and hits the border.
        assert_eq!(
            learner.greedy_path(&table, Node::new(0, 0), Node::new(6, 6)),
            Err(PathError::Incomplete { steps: 0 })
        );
    }

    #[test]
    fn test_greedy_walk_detects_loops() {
        let grid = grid();
        let learner = QLearner::new(&grid);
        let mut table = QTable::new(&grid);
        *table.values_mut(Node::new(0, 0)) = [0.0, 0.0, 1.0, 0.0];
        *table.values_mut(Node::new(0, 1)) = [1.0, 0.0, 0.0, 0.0];
        assert_eq!(
            learner.greedy_path(&table, Node::new(0, 0), Node::new(6, 6)),
            Err(PathError::Incomplete { steps: 1 })
        );
    }

    #[test]
    fn test_converges_to_astar_path_on_small_maze() {
        let grid = grid();
        let start = Cell::new(0, 0);
        let goal = Cell::new(3, 3);

        let expected = astar::find_path(&grid, start, goal).unwrap();
        let config = QLearningConfig {
            episodes: Some(3000),
            ..QLearningConfig::default()
        };
        let learned = QLearner::with_config(&grid, config)
            .find_path(start, goal, &mut SimpleLCG::new(2918957128))
            .unwrap();

        assert_eq!(learned, expected);
        assert_eq!(learned.cells().len(), 9);
    }

    #[test]
    fn test_too_few_episodes_fail_softly() {
        let grid = grid();
        let config = QLearningConfig {
            episodes: Some(1),
            ..QLearningConfig::default()
        };
        let learner = QLearner::with_config(&grid, config);
        let result = learner.find_path(Cell::new(0, 0), Cell::new(3, 3), &mut SimpleLCG::new(5));
        assert!(matches!(result, Err(PathError::Incomplete { .. })));
    }

    #[test]
    fn test_out_of_bounds_and_trivial() {
        let grid = grid();
        let mut rng = SimpleLCG::new(1);
        assert_eq!(
            find_path(&grid, Cell::new(0, 9), Cell::new(0, 0), &mut rng),
            Err(PathError::OutOfBounds { row: 0, col: 9 })
        );
        let path = find_path(&grid, Cell::new(1, 1), Cell::new(1, 1), &mut rng).unwrap();
        assert_eq!(path.nodes(), &[Node::new(2, 2)]);
    }
}
