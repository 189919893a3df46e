#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for the tile-tanks simulation.
//!
//! Loads the definitions file, generates the session, replays a scripted
//! input sequence for a fixed number of frames and prints what happened.

mod config;
mod script;
mod summary;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tile_tanks_system_stepper::Session;
use tile_tanks_world::query;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{config::Definitions, script::Script, summary::Summary};

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless tile-tanks simulation runner", long_about = None)]
struct Args {
    /// Definitions file listing tiles, maps, the session and tunables.
    #[arg(short, long, default_value = "data/definitions.toml")]
    definitions: PathBuf,

    /// Frames to simulate before stopping.
    #[arg(short, long, default_value_t = 1800)]
    frames: u64,

    /// Simulation rate in frames per second.
    #[arg(long, default_value_t = 60.0)]
    fps: f32,

    /// Overrides the session seed from the definitions file.
    #[arg(long)]
    seed: Option<u64>,

    /// Scripted player input.
    #[arg(long, value_enum, default_value_t = Script::Advance)]
    script: Script,
}

/// Entry point for the tile-tanks command-line runner.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let Definitions {
        assets,
        mut session,
    } = Definitions::from_path(&args.definitions)?;
    if let Some(seed) = args.seed {
        session.seed = seed;
    }
    let dt = 1.0 / args.fps.max(1.0);

    let mut events = Vec::new();
    let mut game = Session::start(&session, &assets, &mut events)
        .with_context(|| format!("failed to start session from {}", args.definitions.display()))?;
    info!(maps = game.worlds().len(), seed = session.seed, "session started");

    let mut summary = Summary::default();
    summary.record(&events);
    for frame in 0..args.frames {
        if game.is_won() {
            break;
        }
        events.clear();
        game.step(&args.script.intents(frame), dt, &mut events);
        summary.record(&events);
    }
    summary.frames = game.frames();

    let world = game.world();
    let survivors = query::entity_view(world)
        .iter()
        .filter(|snapshot| snapshot.alive && !snapshot.kind.is_bullet())
        .count();
    println!("map:           {} of {}", game.map_index() + 1, game.worlds().len());
    println!("survivors:     {survivors}");
    println!("{summary}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
