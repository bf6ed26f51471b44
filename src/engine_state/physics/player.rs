//! The player body: position, velocity, and look orientation.

use cgmath::{Deg, Point3, Vector3, Zero};

use crate::engine_state::camera_state::camera::Camera;
use crate::engine_state::voxels::block::block_type::BlockType;

use super::bounding_box::BoundingBox;

/// Player box width and depth.
pub const PLAYER_WIDTH: f32 = 0.6;
/// Player box height.
pub const PLAYER_HEIGHT: f32 = 1.8;
/// Eye height above the box center.
pub const EYE_OFFSET: f32 = 0.7;

/// The simulated player.
///
/// `position` is the center of the collision box. The camera is kept at the
/// eye position by [`Player::sync_camera`].
#[derive(Debug, Clone)]
pub struct Player {
    /// Center of the collision box
    pub position: Point3<f32>,
    /// Blocks per second
    pub velocity: Vector3<f32>,
    /// Whether the player stood on something after the last step
    pub grounded: bool,
    /// Whether the last step moved at sprint speed
    pub sprinting: bool,
    /// Look orientation and eye position
    pub camera: Camera,
    /// Block type used for placement
    pub selected_block: BlockType,
}

impl Player {
    /// A player at rest at `position`, looking down -Z.
    pub fn new(position: Point3<f32>) -> Self {
        let mut player = Player {
            position,
            velocity: Vector3::zero(),
            grounded: false,
            sprinting: false,
            camera: Camera::new(position, Deg(0.0), Deg(0.0)),
            selected_block: BlockType::DIRT,
        };
        player.sync_camera();
        player
    }

    /// A player standing just above the block whose top face is at
    /// `surface_y + 0.5`.
    pub fn standing_on(x: f32, surface_y: i32, z: f32) -> Self {
        Self::new(Point3::new(x, surface_y as f32 + 0.5 + PLAYER_HEIGHT / 2.0 + 0.01, z))
    }

    /// The collision box at the current position.
    pub fn bounding_box(&self) -> BoundingBox {
        Self::box_at(self.position)
    }

    /// The collision box for a player centered on `position`.
    pub fn box_at(position: Point3<f32>) -> BoundingBox {
        BoundingBox::from_center(position, Vector3::new(PLAYER_WIDTH, PLAYER_HEIGHT, PLAYER_WIDTH))
    }

    /// Eye position used for rays and the view matrix.
    pub fn eye_position(&self) -> Point3<f32> {
        self.position + Vector3::new(0.0, EYE_OFFSET, 0.0)
    }

    /// Moves the camera to the eye position.
    pub fn sync_camera(&mut self) {
        self.camera.position = self.eye_position();
    }
}
