//! # Voxel World Headless Runner
//!
//! Loads settings, optionally restores a save, runs a fixed number of
//! simulation steps with scripted input and optionally writes a save.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- --seed 42 --steps 400 --save world.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use voxel_world::application_state::{run, settings::Settings, RunOptions};

#[derive(Debug, Parser)]
#[command(version, about = "Runs the voxel world simulation without a window")]
struct Args {
    /// JSON settings file
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Overrides the seed from the settings
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides the render distance from the settings
    #[arg(long)]
    render_distance: Option<i32>,
    /// Number of simulation steps
    #[arg(long, default_value_t = 200)]
    steps: u64,
    /// Milliseconds of simulated time per step
    #[arg(long, default_value_t = 50)]
    step_millis: u64,
    /// Save to restore before running
    #[arg(long)]
    load: Option<PathBuf>,
    /// Where to write a save after running
    #[arg(long)]
    save: Option<PathBuf>,
}

fn main() -> ExitCode {
    voxel_world::init_logging();
    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if let Some(render_distance) = args.render_distance {
        settings.render_distance = render_distance;
    }
    if let Err(e) = settings.validate() {
        log::error!("{}", e);
        return ExitCode::FAILURE;
    }

    let options = RunOptions {
        settings,
        steps: args.steps,
        step_duration: Duration::from_millis(args.step_millis),
        load_path: args.load,
        save_path: args.save,
    };
    match run(&options) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
