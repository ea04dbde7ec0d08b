#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter: parses a task description, runs the planner and
//! writes the solution stream.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gridwrap_system_partition::DEFAULT_TILE_EDGE;
use gridwrap_system_swarm::{solve, SolveOptions, Strategy, TourStyle};
use gridwrap_world::query;

mod solution;
mod task;

use task::Task;

/// Coverage planner for wrapping tasks.
#[derive(Debug, Parser)]
#[command(name = "gridwrap")]
struct Options {
    /// Task description file.
    task: PathBuf,

    /// Output path; defaults to the task path with a `.sol` extension.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the solution to stdout instead of writing a file.
    #[arg(long)]
    stdout: bool,

    /// Decode the emitted solution and replay it against a fresh world
    /// before accepting it.
    #[arg(long)]
    check: bool,

    /// Ignore cloning opportunities and run a single robot.
    #[arg(long)]
    solo: bool,

    /// Order regions with the spanning-tree walk instead of the tour
    /// approximation.
    #[arg(long)]
    spanning_tree: bool,

    /// Edge length of the segmentation windows, in cells.
    #[arg(long, default_value_t = DEFAULT_TILE_EDGE)]
    tile_edge: i32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = Options::parse();

    let text = fs::read_to_string(&options.task)
        .with_context(|| format!("reading task file {}", options.task.display()))?;
    let name = options
        .task
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "task".to_owned());

    let task = Task::parse(&name, &text)
        .with_context(|| format!("parsing task description {name}"))?;
    let world = task.to_world();
    info!(
        task = %task.name,
        boosters = task.boosters.len(),
        obstacles = task.obstacles.len(),
        "task loaded"
    );

    let solve_options = SolveOptions {
        tile_edge: options.tile_edge,
        strategy: if options.solo {
            Strategy::Solo
        } else {
            Strategy::Swarm
        },
        tour: if options.spanning_tree {
            TourStyle::SpanningTree
        } else {
            TourStyle::Christofides
        },
    };

    let result = solve(world, solve_options);
    if !result.is_solved() {
        warn!("some cells were unreachable and remain unwrapped");
    }
    info!(
        rounds = result.rounds(),
        robots = query::robot_count(result.world()),
        commands = result.command_count(),
        "planning finished"
    );

    let encoded = solution::encode(result.streams());
    if options.check {
        let streams = solution::decode(&encoded).context("decoding the emitted solution")?;
        let replayed = solution::replay(task.to_world(), &streams)
            .context("replaying the emitted solution")?;
        anyhow::ensure!(
            query::has_solved(&replayed) == result.is_solved(),
            "replay disagrees with the planner about coverage"
        );
        info!("replay check passed");
    }

    if options.stdout {
        println!("{encoded}");
    } else {
        let path = options
            .output
            .unwrap_or_else(|| options.task.with_extension("sol"));
        fs::write(&path, &encoded)
            .with_context(|| format!("writing solution to {}", path.display()))?;
        info!(path = %path.display(), "solution written");
    }

    Ok(())
}
