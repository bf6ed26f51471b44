//! # Player Physics
//!
//! Walking, jumping, gravity, and collision against the chunk store.
//!
//! Every step:
//! 1. Horizontal velocity is set from the movement input (not accelerated)
//! 2. A jump is applied if the player stands on something
//! 3. Gravity is integrated, twice as strong while rising
//! 4. The displacement is split into sub-steps of at most
//!    [`MAX_SUBSTEP_DISTANCE`] per axis and resolved against solid blocks
//!
//! Collision resolution tries the whole sub-step first, then each axis on its
//! own in the order X, Z, Y, so the player slides along walls and floors.
//! Blocks in chunks that are not resident are not solid.

use cgmath::{InnerSpace, Point3, Vector3, Zero};

use crate::engine_state::voxels::chunk_store::ChunkStore;

pub mod bounding_box;
pub mod player;

use bounding_box::BoundingBox;
use player::Player;

/// Largest per-axis movement resolved at once.
pub const MAX_SUBSTEP_DISTANCE: f32 = 0.25;
/// How far below the feet the ground check looks.
pub const GROUND_CHECK_DEPTH: f32 = 0.05;
/// Speed multiplier while sprinting.
pub const SPRINT_MULTIPLIER: f32 = 2.0;

/// Tunable physics constants.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    /// Downward acceleration in blocks per second squared
    pub gravity: f32,
    /// Upward speed given by a jump
    pub jump_force: f32,
    /// Walking speed in blocks per second
    pub move_speed: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            gravity: 32.0,
            jump_force: 9.0,
            move_speed: 4.3,
        }
    }
}

/// Movement intent for one step.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MovementInput {
    /// +1 forward, -1 backward
    pub forward: f32,
    /// +1 right, -1 left
    pub strafe: f32,
    /// Whether jump is held
    pub jump: bool,
    /// Whether sprint is held
    pub sprint: bool,
}

/// Whether any solid block overlaps `bbox`.
pub fn collides(store: &ChunkStore, bbox: &BoundingBox) -> bool {
    bbox.block_cells()
        .any(|cell| store.is_solid(cell) && bbox.intersects(&BoundingBox::block(cell)))
}

/// Whether solid ground lies just below the player's feet.
///
/// Tests a slab [`GROUND_CHECK_DEPTH`] thick under the whole bottom face, so
/// standing with part of the box over an edge still counts.
pub fn is_on_ground(store: &ChunkStore, player: &Player) -> bool {
    let feet = player.bounding_box();
    let slab = BoundingBox {
        min: Point3::new(feet.min.x, feet.min.y - GROUND_CHECK_DEPTH, feet.min.z),
        max: Point3::new(feet.max.x, feet.min.y, feet.max.z),
    };
    collides(store, &slab)
}

fn axis(vector: Vector3<f32>, index: usize) -> Vector3<f32> {
    let mut only = Vector3::zero();
    only[index] = vector[index];
    only
}

/// Steps player movement against a chunk store.
#[derive(Debug, Clone, Default)]
pub struct PhysicsSystem {
    /// Constants used by every step
    pub config: PhysicsConfig,
}

impl PhysicsSystem {
    /// Creates a physics system with the given constants.
    pub fn new(config: PhysicsConfig) -> Self {
        PhysicsSystem { config }
    }

    /// Advances the player by `dt` seconds.
    ///
    /// # Arguments
    /// * `player` - Position, velocity and camera to update in place
    /// * `store` - Blocks to collide with; chunks that are not resident are empty
    /// * `input` - Movement intent for this step
    /// * `dt` - Elapsed seconds. Non-finite or non-positive values leave the player untouched
    ///
    /// # Performance
    /// The displacement is split into sub-steps of at most
    /// [`MAX_SUBSTEP_DISTANCE`] per axis, so cost grows with speed times `dt`.
    pub fn step(&self, player: &mut Player, store: &ChunkStore, input: MovementInput, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        let mut wish = player.camera.forward() * input.forward + player.camera.right() * input.strafe;
        if wish.magnitude2() > 0.0 {
            wish = wish.normalize();
        }
        let speed = self.config.move_speed * if input.sprint { SPRINT_MULTIPLIER } else { 1.0 };
        player.velocity.x = wish.x * speed;
        player.velocity.z = wish.z * speed;
        player.sprinting = input.sprint && wish.magnitude2() > 0.0;

        if input.jump && is_on_ground(store, player) {
            player.velocity.y = self.config.jump_force;
        }

        let gravity = if player.velocity.y > 0.0 {
            self.config.gravity * 2.0
        } else {
            self.config.gravity
        };
        player.velocity.y -= gravity * dt;

        let displacement = player.velocity * dt;
        let largest = displacement.x.abs().max(displacement.y.abs()).max(displacement.z.abs());
        let substeps = (largest / MAX_SUBSTEP_DISTANCE).ceil().max(1.0) as u32;
        let delta = displacement / substeps as f32;

        let mut landed = false;
        for _ in 0..substeps {
            landed |= self.move_with_collision(player, store, delta);
        }

        player.grounded = landed || (player.velocity.y <= 0.0 && is_on_ground(store, player));
        player.sync_camera();
    }

    /// Resolves one sub-step. Returns whether a downward move was blocked.
    fn move_with_collision(&self, player: &mut Player, store: &ChunkStore, delta: Vector3<f32>) -> bool {
        let current = player.bounding_box();
        if !collides(store, &current.translated(delta)) {
            player.position += delta;
            return false;
        }

        let mut landed = false;
        // X, then Z, then Y
        for index in [0, 2, 1] {
            let step = axis(delta, index);
            if step[index] == 0.0 {
                continue;
            }
            let moved = player.bounding_box().translated(step);
            if !collides(store, &moved) {
                player.position += step;
            } else if index == 1 {
                if step.y < 0.0 {
                    landed = true;
                }
                player.velocity.y = 0.0;
            }
        }
        landed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockType;
    use super::player::PLAYER_HEIGHT;
    use crate::engine_state::voxels::chunk::Chunk;
    use proptest::prelude::*;

    /// A 16x16 stone floor at y = 0 and a wall at x = 5.
    fn test_store() -> ChunkStore {
        let mut store = ChunkStore::new();
        store.insert_chunk(Chunk::empty(Point3::new(0, 0, 0)));
        for x in 0..16 {
            for z in 0..16 {
                store.place_block(Point3::new(x, 0, z), BlockType::STONE).unwrap();
            }
        }
        for y in 1..4 {
            for z in 0..16 {
                store.place_block(Point3::new(5, y, z), BlockType::STONE).unwrap();
            }
        }
        store
    }

    #[test]
    fn falling_player_lands_on_the_floor() {
        let store = test_store();
        let physics = PhysicsSystem::default();
        let mut player = Player::new(Point3::new(2.0, 6.0, 2.0));
        for _ in 0..200 {
            physics.step(&mut player, &store, MovementInput::default(), 1.0 / 60.0);
        }
        assert!(player.grounded);
        assert!(!collides(&store, &player.bounding_box()));
        // Feet rest on the floor top at y = 0.5.
        let feet = player.position.y - PLAYER_HEIGHT / 2.0;
        assert!((0.5..0.56).contains(&feet), "feet at {}", feet);
    }

    #[test]
    fn walls_stop_horizontal_movement() {
        let store = test_store();
        let physics = PhysicsSystem::default();
        let mut player = Player::standing_on(2.0, 0, 8.0);
        // Yaw 90 faces +X.
        player.camera.set_orientation(cgmath::Deg(90.0), cgmath::Deg(0.0));
        let input = MovementInput {
            forward: 1.0,
            ..MovementInput::default()
        };
        for _ in 0..120 {
            physics.step(&mut player, &store, input, 1.0 / 60.0);
        }
        assert!(player.position.x <= 4.5 - 0.3 + 1e-4);
        assert!(player.position.x > 3.5);
    }

    #[test]
    fn jump_only_from_the_ground() {
        let store = test_store();
        let physics = PhysicsSystem::default();
        let jump = MovementInput {
            jump: true,
            ..MovementInput::default()
        };

        let mut airborne = Player::new(Point3::new(2.0, 8.0, 2.0));
        physics.step(&mut airborne, &store, jump, 1.0 / 60.0);
        assert!(airborne.velocity.y < 0.0);

        let mut standing = Player::standing_on(2.0, 0, 2.0);
        physics.step(&mut standing, &store, MovementInput::default(), 1.0 / 60.0);
        physics.step(&mut standing, &store, jump, 1.0 / 60.0);
        assert!(standing.velocity.y > 0.0);
    }

    #[test]
    fn sprint_doubles_speed() {
        let store = ChunkStore::new();
        let physics = PhysicsSystem::default();
        let mut player = Player::new(Point3::new(0.0, 100.0, 0.0));
        let input = MovementInput {
            forward: 1.0,
            sprint: true,
            ..MovementInput::default()
        };
        physics.step(&mut player, &store, input, 0.1);
        let horizontal = Vector3::new(player.velocity.x, 0.0, player.velocity.z).magnitude();
        assert!((horizontal - 2.0 * physics.config.move_speed).abs() < 1e-4);
        assert!(player.sprinting);

        let walk = MovementInput {
            sprint: false,
            ..input
        };
        physics.step(&mut player, &store, walk, 0.1);
        assert!(!player.sprinting);
    }

    #[test]
    fn sprint_without_movement_is_not_sprinting() {
        let store = ChunkStore::new();
        let physics = PhysicsSystem::default();
        let mut player = Player::new(Point3::new(0.0, 100.0, 0.0));
        let input = MovementInput {
            sprint: true,
            ..MovementInput::default()
        };
        physics.step(&mut player, &store, input, 0.1);
        assert!(!player.sprinting);
    }

    #[test]
    fn jump_from_a_block_edge() {
        let mut store = ChunkStore::new();
        store.insert_chunk(Chunk::empty(Point3::new(0, 0, 0)));
        store.place_block(Point3::new(2, 0, 2), BlockType::STONE).unwrap();
        let physics = PhysicsSystem::default();

        // Box spans x 2.4..3.0; the block spans x 1.5..2.5, so the center hangs past the edge.
        let mut player = Player::standing_on(2.7, 0, 2.0);
        for _ in 0..10 {
            physics.step(&mut player, &store, MovementInput::default(), 1.0 / 60.0);
        }
        assert!(player.grounded);
        assert!(is_on_ground(&store, &player));

        let jump = MovementInput {
            jump: true,
            ..MovementInput::default()
        };
        physics.step(&mut player, &store, jump, 1.0 / 60.0);
        assert!(player.velocity.y > 0.0);
    }

    #[test]
    fn beside_a_block_is_not_ground() {
        let mut store = ChunkStore::new();
        store.insert_chunk(Chunk::empty(Point3::new(0, 0, 0)));
        store.place_block(Point3::new(2, 0, 2), BlockType::STONE).unwrap();

        // Box spans x 2.55..3.15, just clear of the block's +X face.
        let player = Player::standing_on(2.85, 0, 2.0);
        assert!(!is_on_ground(&store, &player));
    }

    #[test]
    fn unloaded_chunks_do_not_collide() {
        let store = ChunkStore::new();
        let physics = PhysicsSystem::default();
        let mut player = Player::new(Point3::new(0.0, 10.0, 0.0));
        physics.step(&mut player, &store, MovementInput::default(), 0.5);
        assert!(player.position.y < 10.0);
        assert!(!player.grounded);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn player_never_ends_inside_blocks(
            start_x in 1.0f32..14.0,
            start_z in 1.0f32..14.0,
            yaw in 0.0f32..360.0,
            forward in -1.0f32..1.0,
            strafe in -1.0f32..1.0,
            jump in any::<bool>(),
            sprint in any::<bool>(),
            dt in 0.001f32..0.5,
        ) {
            let store = test_store();
            let physics = PhysicsSystem::default();
            let mut player = Player::new(Point3::new(start_x, 6.0, start_z));
            prop_assume!(!collides(&store, &player.bounding_box()));
            player.camera.set_orientation(cgmath::Deg(yaw), cgmath::Deg(0.0));
            let input = MovementInput { forward, strafe, jump, sprint };
            for _ in 0..20 {
                physics.step(&mut player, &store, input, dt);
                prop_assert!(!collides(&store, &player.bounding_box()));
            }
        }
    }
}
