//! # Settings
//!
//! Tunables loaded from a JSON file. Every field has a default, so a file
//! only needs the values it changes and a missing file is not required at
//! all.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine_state::physics::PhysicsConfig;
use crate::engine_state::voxels::streamer::default_worker_count;
use crate::engine_state::voxels::world::WorldConfig;
use crate::error::ConfigError;

/// Largest accepted render distance, in chunks.
pub const MAX_RENDER_DISTANCE: i32 = 32;

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// World seed
    pub seed: u64,
    /// Chebyshev radius, in chunks, kept resident around the player
    pub render_distance: i32,
    /// Downward acceleration in blocks per second squared
    pub gravity: f32,
    /// Upward speed given by a jump
    pub jump_force: f32,
    /// Walking speed in blocks per second
    pub move_speed: f32,
    /// Degrees of rotation per unit of look input
    pub mouse_sensitivity: f32,
    /// Targeting reach in blocks
    pub max_ray_distance: f32,
    /// Distance between targeting ray samples
    pub ray_step: f32,
    /// Vertical field of view in degrees
    pub field_of_view: f32,
    /// Viewport width used for the projection
    pub viewport_width: u32,
    /// Viewport height used for the projection
    pub viewport_height: u32,
    /// Generation threads; one less than the core count when absent
    pub worker_threads: Option<usize>,
    /// How long shutdown waits for in-flight generation
    pub shutdown_grace_millis: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            seed: 0,
            render_distance: 4,
            gravity: 32.0,
            jump_force: 9.0,
            move_speed: 4.3,
            mouse_sensitivity: 0.15,
            max_ray_distance: 6.0,
            ray_step: 0.05,
            field_of_view: 70.0,
            viewport_width: 1280,
            viewport_height: 720,
            worker_threads: None,
            shutdown_grace_millis: 2000,
        }
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.into(),
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be a positive number, got {}", value)))
    }
}

impl Settings {
    /// Reads and validates settings from a JSON file.
    ///
    /// # Errors
    /// I/O failures, malformed JSON, and out-of-range values.
    pub fn load(path: &Path) -> Result<Settings, ConfigError> {
        let text = fs::read_to_string(path)?;
        let settings = Self::from_json_str(&text)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Parses and validates settings from JSON text.
    pub fn from_json_str(text: &str) -> Result<Settings, ConfigError> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0..=MAX_RENDER_DISTANCE).contains(&self.render_distance) {
            return Err(invalid(
                "render_distance",
                format!("must be in 0..={}, got {}", MAX_RENDER_DISTANCE, self.render_distance),
            ));
        }
        if !(self.gravity.is_finite() && self.gravity >= 0.0) {
            return Err(invalid("gravity", "must be a non-negative number"));
        }
        positive("jump_force", self.jump_force)?;
        positive("move_speed", self.move_speed)?;
        positive("mouse_sensitivity", self.mouse_sensitivity)?;
        positive("max_ray_distance", self.max_ray_distance)?;
        positive("ray_step", self.ray_step)?;
        if !(self.field_of_view > 1.0 && self.field_of_view < 179.0) {
            return Err(invalid("field_of_view", "must be between 1 and 179 degrees"));
        }
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(invalid("viewport_width", "viewport must not be empty"));
        }
        if self.worker_threads == Some(0) {
            return Err(invalid("worker_threads", "must be at least 1"));
        }
        Ok(())
    }

    /// Generation threads to start.
    pub fn worker_count(&self) -> usize {
        self.worker_threads.unwrap_or_else(default_worker_count)
    }

    /// Grace period for worker shutdown.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_millis)
    }

    /// World construction parameters.
    pub fn world_config(&self) -> WorldConfig {
        WorldConfig {
            seed: self.seed,
            render_distance: self.render_distance,
            workers: self.worker_count(),
            shutdown_grace: self.shutdown_grace(),
        }
    }

    /// Physics constants.
    pub fn physics_config(&self) -> PhysicsConfig {
        PhysicsConfig {
            gravity: self.gravity,
            jump_force: self.jump_force,
            move_speed: self.move_speed,
        }
    }
}
