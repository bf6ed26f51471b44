//! # Error Types
//!
//! Every fallible operation in the crate returns one of the enums below.
//! Lookup misses (querying an unloaded chunk or an empty cell) are not
//! errors and are reported as `None` instead.

use cgmath::Point3;
use thiserror::Error;

/// Faults raised while synthesizing a chunk.
///
/// These never reach the simulation thread: the streamer logs them, drops the
/// task, and leaves the coordinate eligible for another request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Converting the chunk coordinate to world block coordinates overflowed `i32`.
    #[error("chunk coordinate {0:?} overflows world block coordinates")]
    CoordinateOverflow(Point3<i32>),
    /// The generation task panicked on its worker thread.
    #[error("generation of chunk {0:?} panicked: {1}")]
    WorkerPanic(Point3<i32>, String),
}

/// Failures of block placement and destruction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// The chunk containing the position is not loaded.
    #[error("chunk {0:?} is not resident")]
    ChunkNotResident(Point3<i32>),
    /// A block already occupies the position.
    #[error("position {0:?} is already occupied")]
    Occupied(Point3<i32>),
    /// There is no block to destroy at the position.
    #[error("no block at {0:?}")]
    NoBlock(Point3<i32>),
    /// The block has an infinite break time.
    #[error("block at {0:?} cannot be broken")]
    Unbreakable(Point3<i32>),
    /// Placing the block would overlap the player's bounding box.
    #[error("placing at {0:?} would overlap the player")]
    ObstructedByPlayer(Point3<i32>),
    /// The position's chunk coordinate cannot be represented.
    #[error("position {0:?} is outside the addressable world")]
    CoordinateOverflow(Point3<i32>),
}

/// Failures while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    /// The settings file is not valid JSON for [`Settings`](crate::application_state::settings::Settings).
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    /// A setting is outside its valid range.
    #[error("invalid setting `{name}`: {reason}")]
    Invalid {
        /// Name of the offending field.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Failures while writing or reading a save payload.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The underlying reader or writer failed.
    #[error("save i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// The payload could not be encoded or decoded.
    #[error("save payload is malformed: {0}")]
    Json(#[from] serde_json::Error),
}
