use std::sync::{Mutex, MutexGuard};

use actix_web::{http::StatusCode, web, HttpResponse, Responder, ResponseError};
use host::{solve, Algorithm, MazeReport, PathReport};
use maze_core::{
    Cell, Maze, MazeError, Node, PathError, PixelPoint, RandomSource, SelectionState, SimpleLCG,
    Viewport,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ServerConfig;

/// The shared maze and the seed that generated it.
#[derive(Debug, Default)]
pub struct Session {
    pub maze: Maze,
    /// `None` once a maze is loaded from text
    pub seed: Option<u32>,
}

impl Session {
    fn view(&self) -> Result<SessionView, ApiError> {
        SessionView::capture(&self.maze, self.seed)
    }
}

/// One shared maze session plus a seed source.
pub struct AppState {
    pub session: Mutex<Session>,
    pub seeds: Mutex<SimpleLCG>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig, seeds: SimpleLCG) -> Self {
        Self {
            session: Mutex::new(Session::default()),
            seeds: Mutex::new(seeds),
            config,
        }
    }

    /// Lock the session. Blocks, so handlers call it from `web::block`.
    fn session(&self) -> Result<MutexGuard<'_, Session>, ApiError> {
        self.session
            .lock()
            .map_err(|_| ApiError::Internal("maze session lock poisoned".to_string()))
    }

    fn next_seed(&self) -> Result<u32, ApiError> {
        let mut seeds = self
            .seeds
            .lock()
            .map_err(|_| ApiError::Internal("seed lock poisoned".to_string()))?;
        Ok(seeds.next_u32())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Maze(#[from] MazeError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("{0}")]
    Internal(String),
}

impl From<host::HostError> for ApiError {
    fn from(err: host::HostError) -> Self {
        match err {
            host::HostError::Maze(e) => ApiError::Maze(e),
            host::HostError::Path(e) => ApiError::Path(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Maze(MazeError::InvalidSize { .. } | MazeError::InvalidData { .. }) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Maze(MazeError::FileNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Maze(MazeError::NoMaze) => StatusCode::CONFLICT,
            ApiError::Maze(MazeError::Path(err)) | ApiError::Path(err) => match err {
                PathError::OutOfBounds { .. } => StatusCode::BAD_REQUEST,
                PathError::NoPath | PathError::Incomplete { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            },
            ApiError::Maze(MazeError::Io(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            success: false,
            error: self.to_string(),
        })
    }
}

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub rows: usize,
    pub cols: usize,
    pub seed: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    /// Maze in the text format
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub x: f32,
    pub y: f32,
    /// Defaults to the configured viewport
    pub viewport: Option<Viewport>,
}

#[derive(Debug, Deserialize)]
pub struct LearnRequest {
    pub start: Cell,
    pub goal: Cell,
    pub seed: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SolveRequest {
    pub maze: MazeReport,
    #[serde(default)]
    pub algorithm: Algorithm,
    pub start: Cell,
    pub goal: Cell,
    pub seed: Option<u32>,
}

/// Snapshot of the shared session
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionView {
    pub maze: MazeReport,
    pub state: SelectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<Cell>,
    /// Logical cells of the current path, start to goal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Cell>>,
    /// Occupancy-grid nodes of the current path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<Node>>,
}

impl SessionView {
    fn capture(maze: &Maze, seed: Option<u32>) -> Result<Self, ApiError> {
        let (walls, finder) = maze
            .walls()
            .zip(maze.path_finder())
            .ok_or(MazeError::NoMaze)?;

        Ok(Self {
            maze: MazeReport::from_walls(walls, seed),
            state: finder.state(),
            start: finder.start(),
            end: finder.end(),
            path: finder.path().map(|path| path.cells()),
            nodes: finder.path().map(|path| path.nodes().to_vec()),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session: SessionView,
    /// For selections: whether the endpoint moved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SolveResponse {
    pub success: bool,
    pub path: PathReport,
}

fn session_ok(session: SessionView, changed: Option<bool>) -> HttpResponse {
    HttpResponse::Ok().json(SessionResponse {
        success: true,
        session,
        changed,
    })
}

// API Handlers

/// GET /health
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "maze-api"
    }))
}

/// POST /api/maze/generate
/// Generate a new maze into the session
async fn generate(
    state: web::Data<AppState>,
    req: web::Json<GenerateRequest>,
) -> Result<HttpResponse, ApiError> {
    let GenerateRequest { rows, cols, seed } = req.into_inner();
    let seed = match seed {
        Some(seed) => seed,
        None => state.next_seed()?,
    };
    tracing::info!("Received generate request: {}x{} seed {}", rows, cols, seed);

    let session = web::block(move || -> Result<SessionView, ApiError> {
        let mut session = state.session()?;
        session.maze.generate(rows, cols, &mut SimpleLCG::new(seed))?;
        session.seed = Some(seed);

        // The new maze stays in the session even when the copy on disk fails
        if let Some(dir) = &state.config.save_dir {
            match session.maze.save_generated(dir) {
                Ok(file) => tracing::info!("Saved generated maze to {}", file.display()),
                Err(err) => {
                    tracing::warn!("Could not save generated maze to {}: {}", dir.display(), err)
                }
            }
        }
        session.view()
    })
    .await??;

    Ok(session_ok(session, None))
}

/// POST /api/maze/load
/// Replace the session maze with one in the text format
async fn load(
    state: web::Data<AppState>,
    req: web::Json<LoadRequest>,
) -> Result<HttpResponse, ApiError> {
    let LoadRequest { text } = req.into_inner();
    tracing::info!("Received load request ({} bytes)", text.len());

    let session = web::block(move || -> Result<SessionView, ApiError> {
        let mut session = state.session()?;
        session.seed = None;
        if let Err(err) = session.maze.load_str(&text) {
            tracing::warn!("Rejected maze text: {}", err);
            return Err(err.into());
        }
        session.view()
    })
    .await??;

    Ok(session_ok(session, None))
}

/// GET /api/maze
async fn session(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let session =
        web::block(move || -> Result<SessionView, ApiError> { state.session()?.view() }).await??;
    Ok(session_ok(session, None))
}

async fn select(
    state: web::Data<AppState>,
    req: SelectRequest,
    set: fn(&mut Maze, PixelPoint, Viewport) -> Result<bool, MazeError>,
) -> Result<HttpResponse, ApiError> {
    let point = PixelPoint::new(req.x, req.y);
    let viewport = req.viewport.unwrap_or(state.config.viewport);

    let (changed, session) = web::block(move || -> Result<(bool, SessionView), ApiError> {
        let mut session = state.session()?;
        let changed = set(&mut session.maze, point, viewport)?;
        Ok((changed, session.view()?))
    })
    .await??;

    Ok(session_ok(session, Some(changed)))
}

/// POST /api/maze/start
/// Select the start cell by viewport pixel; runs A* once both ends are set
async fn set_start(
    state: web::Data<AppState>,
    req: web::Json<SelectRequest>,
) -> Result<HttpResponse, ApiError> {
    tracing::info!("Received start selection at ({}, {})", req.x, req.y);
    select(state, req.into_inner(), Maze::set_start).await
}

/// POST /api/maze/end
async fn set_end(
    state: web::Data<AppState>,
    req: web::Json<SelectRequest>,
) -> Result<HttpResponse, ApiError> {
    tracing::info!("Received end selection at ({}, {})", req.x, req.y);
    select(state, req.into_inner(), Maze::set_end).await
}

/// POST /api/maze/learn
/// Q-learning search between two cells; the session adopts the result on success
async fn learn(
    state: web::Data<AppState>,
    req: web::Json<LearnRequest>,
) -> Result<HttpResponse, ApiError> {
    let LearnRequest { start, goal, seed } = req.into_inner();
    let seed = match seed {
        Some(seed) => seed,
        None => state.next_seed()?,
    };
    tracing::info!("Received learn request {} -> {} seed {}", start, goal, seed);

    let session = web::block(move || -> Result<SessionView, ApiError> {
        let mut session = state.session()?;
        session.maze.find_by_learning(start, goal, &mut SimpleLCG::new(seed))?;
        session.view()
    })
    .await??;

    Ok(session_ok(session, None))
}

/// POST /api/maze/reset
/// Clear endpoints and path
async fn reset(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let session = web::block(move || -> Result<SessionView, ApiError> {
        let mut session = state.session()?;
        session.maze.reset_path();
        session.view()
    })
    .await??;

    Ok(session_ok(session, None))
}

/// POST /api/solve
/// Stateless search over a maze sent with the request
async fn solve_maze(
    state: web::Data<AppState>,
    req: web::Json<SolveRequest>,
) -> Result<HttpResponse, ApiError> {
    let SolveRequest {
        maze,
        algorithm,
        start,
        goal,
        seed,
    } = req.into_inner();
    let seed = match seed {
        Some(seed) => seed,
        None => state.next_seed()?,
    };
    tracing::info!(
        "Received solve request: {}x{} {} -> {} with {}",
        maze.rows,
        maze.cols,
        start,
        goal,
        algorithm
    );

    let path = web::block(move || -> Result<PathReport, ApiError> {
        let walls = maze.to_walls()?;
        Ok(solve(&walls, algorithm, start, goal, seed)?)
    })
    .await??;

    Ok(HttpResponse::Ok().json(SolveResponse {
        success: true,
        path,
    }))
}

/// Register every route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/api/maze", web::get().to(session))
        .route("/api/maze/generate", web::post().to(generate))
        .route("/api/maze/load", web::post().to(load))
        .route("/api/maze/start", web::post().to(set_start))
        .route("/api/maze/end", web::post().to(set_end))
        .route("/api/maze/learn", web::post().to(learn))
        .route("/api/maze/reset", web::post().to(reset))
        .route("/api/solve", web::post().to(solve_maze));
}
