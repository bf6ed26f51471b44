#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! The simulation core of an infinite, chunked voxel world.
//!
//! This crate generates terrain from a seed, streams chunks in and out around
//! a moving player on a worker pool, and decides which blocks are worth
//! drawing. It also resolves player movement and block targeting against the
//! voxel grid.
//!
//! ## Key Modules
//!
//! * `application_state` - Settings, input tracking and the headless run loop
//! * `core` - Core utilities and data structures used throughout the engine
//! * `engine_state` - The simulation subsystems: voxels, physics, visibility and task management
//! * `error` - Error types returned by fallible operations
//!
//! ## Architecture
//!
//! The engine follows a modular architecture with clear separation between:
//! * Voxel data and its background generation
//! * Per-step simulation (physics, targeting, block interaction)
//! * Visibility output for a renderer
//!
//! ## Usage
//!
//! ```no_run
//! use voxel_world::application_state::{run, RunOptions};
//!
//! voxel_world::init_logging();
//! let summary = run(&RunOptions::default()).unwrap();
//! println!("{} chunks resident", summary.resident_chunks);
//! ```
//!
//! ## Performance Considerations
//!
//! * Sparse chunk storage with an occupancy bit vector
//! * Occlusion is only recomputed for chunks whose neighborhood changed
//! * Frustum culling rejects whole chunks before their blocks are visited
//! * Terrain generation runs off the simulation thread

pub mod application_state;
pub mod core;
pub mod engine_state;
pub mod error;

/// Installs the logger, reading filters from `RUST_LOG` and writing to stdout.
pub fn init_logging() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG");
    if log_builder.try_init().is_ok() {
        log::info!("Logger initialized");
    }
}
