#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless Grid Duel session.

mod layout_transfer;
mod scenario;
mod simulation;
mod text_backend;

use std::{io, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use grid_duel_rendering::RenderingBackend;

use crate::{
    layout_transfer::GridLayoutSnapshot, scenario::Scenario, simulation::Simulation,
    text_backend::TextBackend,
};

/// Plays a turn-based duel between a simulated player and the computer.
#[derive(Debug, Parser)]
#[command(name = "grid-duel", author, version, about, long_about = None)]
struct Args {
    /// Scenario file describing the board and both agents.
    #[arg(long, value_name = "FILE")]
    scenario: Option<PathBuf>,

    /// Layout code replacing the scenario's obstacles.
    #[arg(long, value_name = "CODE")]
    layout: Option<String>,

    /// Number of turns to play.
    #[arg(long, default_value_t = 10)]
    turns: u64,

    /// Seed for the simulated player's selections.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Simulated milliseconds per tick.
    #[arg(long = "dt-ms", default_value_t = 16)]
    dt_ms: u64,

    /// Upper bound on simulated ticks.
    #[arg(long, default_value_t = 1_000_000)]
    max_ticks: u64,

    /// Print the layout code of the resolved board and exit.
    #[arg(long)]
    print_layout: bool,

    /// Draw the board whenever control changes hands.
    #[arg(long)]
    render: bool,
}

/// Entry point for the Grid Duel command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let scenario = load_scenario(&args)?;
    if args.print_layout {
        let code = GridLayoutSnapshot::from_grid(scenario.grid())
            .encode()
            .context("failed to encode layout")?;
        println!("{code}");
        return Ok(());
    }

    let mut simulation =
        Simulation::new(&scenario, args.seed, Duration::from_millis(args.dt_ms))?;
    let mut text = TextBackend::new(io::stdout());
    let backend: Option<&mut dyn RenderingBackend> = if args.render {
        Some(&mut text)
    } else {
        None
    };

    let summary = simulation.run(args.turns, args.max_ticks, backend)?;
    println!(
        "{} turns ({} moves) in {} ticks; human at {}, computer at {}",
        summary.completed_turns,
        summary.moves,
        summary.ticks,
        describe(summary.human),
        describe(summary.computer)
    );
    Ok(())
}

fn load_scenario(args: &Args) -> Result<Scenario> {
    let scenario = match &args.scenario {
        Some(path) => Scenario::from_path(path)?,
        None => Scenario::standard()?,
    };

    let Some(code) = &args.layout else {
        return Ok(scenario);
    };
    let grid = GridLayoutSnapshot::decode(code)
        .context("failed to decode layout code")?
        .into_grid()
        .context("layout code describes an invalid grid")?;
    scenario.with_grid(grid)
}

fn describe(cell: Option<grid_duel_core::CellCoord>) -> String {
    cell.map_or_else(|| "off the board".to_owned(), |cell| cell.to_string())
}
