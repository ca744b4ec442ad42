//! Game entry point
//!
//! Usage: `game [GAME_DIR] [MAX_FRAMES]`. The directory must hold a
//! `game.json`; without one the built-in demo runs instead.

use rengine::app::CONFIG_FILE;
use rengine::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Frames the demo runs for when no limit is given
const DEMO_FRAMES: u64 = 300;

fn main() -> ExitCode {
    // Initialize logging
    rengine::init_logging();

    let mut args = std::env::args().skip(1);
    let dir = args.next().map(PathBuf::from);
    let max_frames = args.next().and_then(|n| n.parse::<u64>().ok());

    let result = match dir {
        Some(dir) if dir.join(CONFIG_FILE).is_file() => run_game(dir, max_frames),
        Some(dir) => {
            error!(dir = %dir.display(), "No {} found", CONFIG_FILE);
            run_demo(max_frames)
        }
        None => run_demo(max_frames),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Game failed");
            ExitCode::FAILURE
        }
    }
}

fn run_game(dir: PathBuf, max_frames: Option<u64>) -> Result<(), EngineError> {
    info!(dir = %dir.display(), "Loading game");
    let mut engine = EngineBuilder::game_dir(&dir)?
        .save_file(dir.join("save.json"))
        .build()?;
    engine.start()?;
    run(&mut engine, max_frames);
    Ok(())
}

fn run_demo(max_frames: Option<u64>) -> Result<(), EngineError> {
    let mut engine = EngineBuilder::new().build()?;
    engine.start_demo()?;
    run(&mut engine, Some(max_frames.unwrap_or(DEMO_FRAMES)));
    Ok(())
}

fn run(engine: &mut Engine, max_frames: Option<u64>) {
    match max_frames {
        Some(limit) => {
            let frames = engine.run_frames(limit);
            info!(frames, "Frame limit reached or game ended");
            engine.shutdown();
        }
        None => engine.run(),
    }
}
