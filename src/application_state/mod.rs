//! # Application State Management
//!
//! This module drives the engine without a window:
//! - Settings loading
//! - Input tracking and a scripted input source
//! - The fixed-step run loop used by the binary
//! - Save restore before the run and save after it

pub mod input_state;
pub mod settings;

use std::path::PathBuf;
use std::time::Duration;

use cgmath::Point3;
use input_state::{InputAction, InputTracker};
use settings::Settings;

use crate::engine_state::{
    persistence,
    visibility::VisibilityStats,
    voxels::block::block_type::BlockType,
    EngineState, StepReport,
};
use crate::error::PersistenceError;

/// Steps between scripted jumps.
pub const JUMP_INTERVAL_STEPS: u64 = 40;
/// Steps between scripted placements.
pub const PLACE_INTERVAL_STEPS: u64 = 25;
/// Scripted horizontal look input per step.
pub const TURN_PER_STEP: f64 = 2.0;

/// Parameters of a headless run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Engine settings
    pub settings: Settings,
    /// Number of simulation steps
    pub steps: u64,
    /// Simulated time per step
    pub step_duration: Duration,
    /// Save to restore before the first step
    pub load_path: Option<PathBuf>,
    /// Where to write a save after the last step
    pub save_path: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            settings: Settings::default(),
            steps: 200,
            step_duration: Duration::from_millis(50),
            load_path: None,
            save_path: None,
        }
    }
}

/// Totals from a headless run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Steps simulated
    pub steps: u64,
    /// Player position after the last step
    pub final_position: Point3<f32>,
    /// Chunks resident after the last step
    pub resident_chunks: usize,
    /// Entries in the modification diff
    pub modifications: usize,
    /// Block edits that went through
    pub edits: usize,
    /// Block edits that were refused
    pub rejected: usize,
    /// Visibility counts from the last step
    pub last_stats: VisibilityStats,
}

/// The engine together with the input feeding it.
pub struct ApplicationState {
    /// The core simulation state
    pub engine_state: EngineState,
    /// Accumulates input between steps
    pub input: InputTracker,
    steps: u64,
}

impl ApplicationState {
    /// Creates the engine from `settings`.
    pub fn new(settings: &Settings) -> Self {
        ApplicationState {
            engine_state: EngineState::new(settings),
            input: InputTracker::new(),
            steps: 0,
        }
    }

    /// Number of steps simulated so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Feeds the scripted input for the next step: walk forward while
    /// turning, jump and place periodically, and cycle the placement type.
    pub fn script_input(&mut self) {
        let step = self.steps;
        self.input.set_held(InputAction::MoveForward, true);
        self.input.set_held(InputAction::Jump, step % JUMP_INTERVAL_STEPS == 0);
        self.input
            .set_held(InputAction::PlaceBlock, step % PLACE_INTERVAL_STEPS == 0);
        self.input.add_look_delta(TURN_PER_STEP, 0.0);
        if step % PLACE_INTERVAL_STEPS == 0 {
            let types = BlockType::all();
            self.input.select_block(types[(step / PLACE_INTERVAL_STEPS) as usize % types.len()]);
        }
    }

    /// Hands the accumulated input to the engine and runs one step.
    pub fn advance(&mut self, dt: Duration) -> StepReport {
        self.engine_state.set_input_commands(self.input.process());
        self.steps += 1;
        self.engine_state.step(dt)
    }
}

/// Runs the engine headless for `options.steps` steps of scripted input.
///
/// # Errors
/// Fails if the save to restore cannot be read or the final save cannot be
/// written.
pub fn run(options: &RunOptions) -> Result<RunSummary, PersistenceError> {
    let mut app = ApplicationState::new(&options.settings);

    if let Some(path) = &options.load_path {
        let payload = persistence::load_from_path(path)?;
        app.engine_state.restore(&payload);
    }

    let mut edits = 0;
    let mut rejected = 0;
    let mut last_stats = VisibilityStats::default();
    for _ in 0..options.steps {
        app.script_input();
        let report = app.advance(options.step_duration);
        edits += report.edits.len();
        rejected += report.rejected.len();
        if let Some(reconcile) = &report.reconcile {
            if reconcile.requested > 0 || !reconcile.evicted.is_empty() {
                log::debug!(
                    "Step {}: {} chunks requested, {} evicted",
                    app.steps(),
                    reconcile.requested,
                    reconcile.evicted.len()
                );
            }
        }
        last_stats = report.stats;
    }

    let engine = &mut app.engine_state;
    let summary = RunSummary {
        steps: app.steps,
        final_position: engine.player.position,
        resident_chunks: engine.world.store().get().len(),
        modifications: engine.world.store().get().diff().len(),
        edits,
        rejected,
        last_stats,
    };
    log::info!(
        "Ran {} steps: player at {:?}, {} chunks resident, {} of {} blocks visible",
        summary.steps,
        summary.final_position,
        summary.resident_chunks,
        last_stats.visible_blocks,
        last_stats.total_blocks
    );

    if let Some(path) = &options.save_path {
        persistence::save_to_path(path, &engine.save_payload())?;
    }
    engine.shutdown();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            seed: 7,
            render_distance: 1,
            worker_threads: Some(1),
            ..Settings::default()
        }
    }

    #[test]
    fn scripted_run_walks_the_player() {
        let summary = run(&RunOptions {
            settings: settings(),
            steps: 60,
            ..RunOptions::default()
        })
        .unwrap();
        assert_eq!(summary.steps, 60);
        assert!(summary.resident_chunks > 0);
        assert!(summary.final_position.x != 0.0 || summary.final_position.z != 0.0);
    }

    #[test]
    fn missing_save_fails_the_run() {
        let result = run(&RunOptions {
            settings: settings(),
            steps: 1,
            load_path: Some(PathBuf::from("/definitely/not/a/save.json")),
            ..RunOptions::default()
        });
        assert!(matches!(result, Err(PersistenceError::Io(_))));
    }
}
