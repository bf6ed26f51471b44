//! # Camera State Management
//!
//! This module handles camera-related functionality:
//! - Eye position and look orientation tracking
//! - View and projection matrix calculations
//! - Chunk-based position tracking for streaming
//!
//! ## Core Components
//! - `Camera`: The eye position and orientation in 3D space
//! - `Projection`: The perspective projection settings

use cgmath::{Matrix4, Point3};

use super::voxels::chunk::{block_coord_of, chunk_coord_of};

pub mod camera;

/// The camera and its projection.
#[derive(Debug, Clone, Copy)]
pub struct CameraState {
    /// The current camera position and orientation
    pub camera: camera::Camera,
    /// The projection used for visibility
    pub projection: camera::Projection,
}

impl CameraState {
    /// Creates a camera state from a camera and projection.
    pub fn new(camera: camera::Camera, projection: camera::Projection) -> Self {
        CameraState { camera, projection }
    }

    /// Combined projection and view matrix.
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection.calc_matrix() * self.camera.calc_matrix()
    }

    /// Chunk coordinate containing the camera.
    pub fn chunk_position(&self) -> Point3<i32> {
        chunk_coord_of(block_coord_of(self.camera.position))
    }
}
