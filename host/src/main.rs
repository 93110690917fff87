use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use host::{
    generate_maze, load_json, load_maze, random_seed, save_json, save_maze, solve, verify_report,
    Algorithm, MazeReport, PathReport,
};
use maze_core::{Cell, OccupancyGrid, Path};

#[derive(Parser)]
#[command(name = "host", about = "Maze generation and path search", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a perfect maze
    Generate {
        #[arg(long, default_value_t = 10)]
        rows: usize,
        #[arg(long, default_value_t = 10)]
        cols: usize,
        /// Seed for generation (random if omitted)
        #[arg(long)]
        seed: Option<u32>,
        /// Save the maze in the text format
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Find a path through a maze file
    Solve {
        maze: PathBuf,
        /// Start cell as `row,col`
        #[arg(long, value_parser = parse_cell, default_value = "0,0")]
        from: Cell,
        /// Goal cell as `row,col` (bottom-right corner if omitted)
        #[arg(long, value_parser = parse_cell)]
        to: Option<Cell>,
        /// astar or qlearning
        #[arg(short, long, default_value_t = Algorithm::AStar)]
        algorithm: Algorithm,
        /// Exploration seed for qlearning (random if omitted)
        #[arg(long)]
        seed: Option<u32>,
        /// Save the path report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a maze file, optionally with a saved path drawn in
    Show {
        maze: PathBuf,
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Check a saved path report against a maze file
    Verify { maze: PathBuf, path: PathBuf },
}

fn parse_cell(s: &str) -> Result<Cell, String> {
    let (row, col) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `row,col`, got '{}'", s))?;
    let row = row.trim().parse().map_err(|_| format!("invalid row '{}'", row))?;
    let col = col.trim().parse().map_err(|_| format!("invalid column '{}'", col))?;
    Ok(Cell::new(row, col))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Generate {
            rows,
            cols,
            seed,
            output,
        } => generate_command(rows, cols, seed.unwrap_or_else(random_seed), output),
        Command::Solve {
            maze,
            from,
            to,
            algorithm,
            seed,
            output,
        } => solve_command(maze, from, to, algorithm, seed.unwrap_or_else(random_seed), output),
        Command::Show { maze, path } => show_command(maze, path),
        Command::Verify { maze, path } => verify_command(maze, path),
    }
}

fn draw(report: &MazeReport, path: Option<&Path>) -> Result<String> {
    let grid = OccupancyGrid::from_walls(&report.to_walls()?);
    Ok(grid.render(path))
}

fn generate_command(rows: usize, cols: usize, seed: u32, output: Option<PathBuf>) -> Result<()> {
    println!("📋 Generating maze");
    println!("  Size: {}x{}", rows, cols);
    println!("  Seed: {}", seed);
    println!();

    let report = generate_maze(rows, cols, seed).context("maze generation failed")?;
    println!("{}", draw(&report, None)?);
    println!();
    println!("✅ Maze generated!");

    if let Some(file) = output {
        save_maze(&report, &file)?;
        println!("💾 Maze saved to: {}", file.display());
    }
    Ok(())
}

fn solve_command(
    maze_file: PathBuf,
    from: Cell,
    to: Option<Cell>,
    algorithm: Algorithm,
    seed: u32,
    output: Option<PathBuf>,
) -> Result<()> {
    let report = load_maze(&maze_file)
        .with_context(|| format!("failed to load {}", maze_file.display()))?;
    let goal = to.unwrap_or(Cell::new(report.rows - 1, report.cols - 1));

    println!("📋 Solving {}x{} maze", report.rows, report.cols);
    println!("  From {} to {}", from, goal);
    println!("  Algorithm: {}", algorithm);
    if algorithm == Algorithm::QLearning {
        println!("  Seed: {}", seed);
    }
    println!();

    let walls = report.to_walls()?;
    let started = Instant::now();
    let path = solve(&walls, algorithm, from, goal, seed)?;
    println!("  Search time: {:.2}s", started.elapsed().as_secs_f64());
    println!();

    println!("{}", draw(&report, Some(&Path::new(path.nodes.clone())))?);
    println!();
    println!("✅ Path found!");
    println!("  Cells: {}", path.cells.len());
    println!("  Steps: {}", path.steps);
    println!("  Path valid: {}", if path.is_valid { "Yes ✓" } else { "No ✗" });

    if let Some(file) = output {
        save_json(&path, &file)?;
        println!("💾 Path saved to: {}", file.display());
    }
    Ok(())
}

fn show_command(maze_file: PathBuf, path_file: Option<PathBuf>) -> Result<()> {
    let report = load_maze(&maze_file)
        .with_context(|| format!("failed to load {}", maze_file.display()))?;
    let path = match path_file {
        Some(file) => {
            let saved: PathReport = load_json(&file)?;
            Some(Path::new(saved.nodes))
        }
        None => None,
    };

    println!("{}", draw(&report, path.as_ref())?);
    Ok(())
}

fn verify_command(maze_file: PathBuf, path_file: PathBuf) -> Result<()> {
    let report = load_maze(&maze_file)
        .with_context(|| format!("failed to load {}", maze_file.display()))?;
    let path: PathReport = load_json(&path_file)
        .with_context(|| format!("failed to read path report {}", path_file.display()))?;

    println!("📋 Verifying {} path", path.algorithm);
    println!("  From {} to {} in {} steps", path.start, path.goal, path.steps);
    println!();

    if !verify_report(&report.to_walls()?, &path) {
        bail!("path does not connect {} to {} in this maze", path.start, path.goal);
    }

    println!("✅ Path verified!");
    Ok(())
}
