//! # Engine State Module
//!
//! The simulation context of the voxel world.
//!
//! ## Key Components
//!
//! * `EngineState` - Owns the world, the player and the per-step systems
//! * `camera_state` - Eye orientation and the view/projection matrices
//! * `physics` - Player movement and collision against the chunk store
//! * `targeting` - Ray marching for the block under the crosshair
//! * `visibility` - Occlusion and frustum culling of resident blocks
//! * `persistence` - Save payloads for player modifications
//! * `task_management` - Manages asynchronous tasks and worker threads
//! * `voxels` - Handles voxel data, chunks, and world generation
//!
//! ## Step Order
//!
//! [`EngineState::step`] runs the subsystems in a fixed order so every pass
//! sees the results of the one before it:
//! 1. Look input rotates the camera
//! 2. Physics moves the player against the resident chunks
//! 3. The targeting ray picks the block under the crosshair
//! 4. Highlight, break progress and placement act on that target
//! 5. The world reconciles chunk residency around the player
//! 6. Visibility recomputes the set of blocks to draw
//!
//! No subsystem holds the chunk store lock across a stage boundary.

use std::time::Duration;

use camera_state::{camera::Projection, CameraState};
use cgmath::{Deg, Point3, Vector3, Zero};
use persistence::{ModificationRecord, PlayerPose, SavePayload};
use physics::{bounding_box::BoundingBox, player::Player, MovementInput, PhysicsSystem};
use targeting::RayTarget;
use visibility::{BlockView, VisibilityStats, VisibilitySystem};
use voxels::{
    block::block_type::BlockType,
    chunk::{block_coord_of, chunk_coord_of},
    chunk_store::ChunkStore,
    world::{ReconcileReport, World},
};

use crate::{
    application_state::{
        input_state::{InputAction, ProcessedInputState},
        settings::Settings,
    },
    error::WorldError,
};

pub mod camera_state;
pub mod persistence;
pub mod physics;
pub mod targeting;
pub mod task_management;
pub mod visibility;
pub mod voxels;

/// Chebyshev radius loaded synchronously around the spawn point.
pub const SPAWN_AREA_RADIUS: i32 = 1;
/// Near clip plane distance.
pub const NEAR_PLANE: f32 = 0.1;
/// Far clip plane distance.
pub const FAR_PLANE: f32 = 1000.0;

/// A block change made by the player during a step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockEdit {
    /// A block of this type was placed at the position
    Placed(Point3<i32>, BlockType),
    /// The block of this type at the position was broken
    Destroyed(Point3<i32>, BlockType),
}

/// What happened during one [`EngineState::step`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Counts from the visibility pass
    pub stats: VisibilityStats,
    /// The residency reconciliation, if one ran this step
    pub reconcile: Option<ReconcileReport>,
    /// Block edits that went through
    pub edits: Vec<BlockEdit>,
    /// Block edits that were refused
    pub rejected: Vec<WorldError>,
}

/// The simulation context for the voxel world
///
/// This struct owns every subsystem and drives them one step at a time.
/// Input is handed over with [`EngineState::set_input_commands`] and consumed
/// by the next [`EngineState::step`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use voxel_world::application_state::settings::Settings;
/// use voxel_world::engine_state::EngineState;
///
/// let mut engine_state = EngineState::new(&Settings::default());
/// for _ in 0..100 {
///     let report = engine_state.step(Duration::from_millis(50));
///     println!("{} blocks visible", report.stats.visible_blocks);
/// }
/// engine_state.shutdown();
/// ```
pub struct EngineState {
    /// Settings the engine was built from
    pub settings: Settings,
    /// The voxel world containing all chunk data
    pub world: World,
    /// The simulated player
    pub player: Player,
    /// Player movement
    pub physics: PhysicsSystem,
    /// Per-step visible block set
    pub visibility: VisibilitySystem,
    /// Projection used for frustum culling
    pub projection: Projection,
    /// Current player actions derived from input
    pub player_actions: PlayerAction,
    /// Block under the crosshair after the last step
    target: Option<RayTarget>,
}

impl EngineState {
    /// Creates the world and places the player on the surface at the origin.
    ///
    /// The chunks around the spawn point are generated before this returns,
    /// so the player has ground under their feet on the first step.
    ///
    /// # Arguments
    /// * `settings` - Seed, render distance, worker count and tuning
    ///
    /// # Performance
    /// Generates the spawn area on the calling thread.
    pub fn new(settings: &Settings) -> Self {
        let world = World::new(settings.world_config());
        let surface = world.generator().surface_height(0, 0);
        let player = Player::standing_on(0.0, surface, 0.0);

        let spawn_chunk = chunk_coord_of(block_coord_of(player.position));
        match world.load_area_blocking(spawn_chunk, SPAWN_AREA_RADIUS) {
            Ok(loaded) => log::info!("Loaded {} spawn chunks around {:?}", loaded, spawn_chunk),
            Err(e) => log::warn!("Spawn area incomplete: {}", e),
        }
        log::info!("Player spawned at {:?}", player.position);

        let projection = Projection::new(
            settings.viewport_width,
            settings.viewport_height,
            Deg(settings.field_of_view),
            NEAR_PLANE,
            FAR_PLANE,
        );

        Self {
            settings: settings.clone(),
            world,
            player,
            physics: PhysicsSystem::new(settings.physics_config()),
            visibility: VisibilitySystem::new(),
            projection,
            player_actions: PlayerAction::default(),
            target: None,
        }
    }

    /// Sets the input commands for the next step.
    ///
    /// # Arguments
    /// * `input` - The processed input state to use for setting commands
    pub fn set_input_commands(&mut self, input: ProcessedInputState) {
        self.player_actions = Self::translate_processed_input(input);
    }

    /// Translates the processed input state into player actions.
    fn translate_processed_input(input: ProcessedInputState) -> PlayerAction {
        PlayerAction {
            // Movement actions - active if pressed or held
            move_forward: input.get_action_state(InputAction::MoveForward).is_active(),
            move_backward: input.get_action_state(InputAction::MoveBackward).is_active(),
            move_left: input.get_action_state(InputAction::MoveLeft).is_active(),
            move_right: input.get_action_state(InputAction::MoveRight).is_active(),
            jump: input.get_action_state(InputAction::Jump).is_active(),
            sprint: input.get_action_state(InputAction::Sprint).is_active(),
            rotate_view: input.get_look_delta(),
            break_block: input.get_action_state(InputAction::BreakBlock).is_active(),
            // Only on press, not hold
            place_block: input.get_action_state(InputAction::PlaceBlock).is_just_pressed(),
            select_block: input.selected_block,
        }
    }

    /// The camera and projection for the current eye position.
    pub fn camera_state(&self) -> CameraState {
        CameraState::new(self.player.camera, self.projection)
    }

    /// Advances the simulation by `dt`.
    ///
    /// Consumes the actions set by the last call to
    /// [`EngineState::set_input_commands`]. In order: look and block
    /// selection, physics, targeting, breaking, placing, chunk residency and
    /// visibility.
    ///
    /// # Arguments
    /// * `dt` - Simulated time to advance; break progress accumulates by it
    ///
    /// # Returns
    /// A [`StepReport`] with the edits made, the edits refused, the
    /// reconciliation if one ran, and the visibility counts.
    ///
    /// # Performance
    /// Takes the store's write lock twice, once for break progress and once
    /// for visibility. Generation never runs on this thread.
    pub fn step(&mut self, dt: Duration) -> StepReport {
        let dt = dt.as_secs_f32();
        let actions = std::mem::take(&mut self.player_actions);
        let mut report = StepReport::default();

        if let Some((dx, dy)) = actions.rotate_view {
            let sensitivity = self.settings.mouse_sensitivity;
            self.player.camera.rotate(dx as f32 * sensitivity, dy as f32 * sensitivity);
        }
        if let Some(block_type) = actions.select_block {
            self.player.selected_block = block_type;
        }

        let store = self.world.store().clone();
        let target = {
            let store = store.get();
            self.physics.step(&mut self.player, &store, actions.movement_input(), dt);
            targeting::cast_ray_from_angles(
                &store,
                self.player.eye_position(),
                self.player.camera.yaw,
                self.player.camera.pitch,
                self.settings.max_ray_distance,
                self.settings.ray_step,
            )
        };

        let broken = {
            let mut store = store.get_mut();
            self.update_highlight(&mut store, target);
            match target.and_then(|t| store.get_block_mut(t.block)) {
                Some(block) if actions.break_block => block.advance_break(dt),
                Some(block) => {
                    block.break_progress = 0.0;
                    false
                }
                None => false,
            }
        };
        self.target = target;

        if let (true, Some(target)) = (broken, target) {
            match self.world.destroy_block(target.block) {
                Ok(block) => {
                    report.edits.push(BlockEdit::Destroyed(target.block, block.block_type));
                    self.target = None;
                }
                Err(e) => report.rejected.push(e),
            }
        }

        if let (true, Some(target)) = (actions.place_block, self.target) {
            match self.try_place(target) {
                Ok(edit) => report.edits.push(edit),
                Err(e) => {
                    log::debug!("Placement refused: {}", e);
                    report.rejected.push(e);
                }
            }
        }

        report.reconcile = self.world.update(self.player.position);

        let view_projection = self.camera_state().view_projection();
        report.stats = self.visibility.update(
            &mut store.get_mut(),
            &view_projection,
            self.player.eye_position(),
        );
        report
    }

    /// Moves the highlight from the previous target to `target`. A block
    /// that loses the highlight also loses its break progress.
    fn update_highlight(&self, store: &mut ChunkStore, target: Option<RayTarget>) {
        let previous = self.target.map(|t| t.block);
        let current = target.map(|t| t.block);
        if previous != current {
            if let Some(block) = previous.and_then(|p| store.get_block_mut(p)) {
                block.highlighted = false;
                block.break_progress = 0.0;
            }
        }
        if let Some(block) = current.and_then(|p| store.get_block_mut(p)) {
            block.highlighted = true;
        }
    }

    fn try_place(&self, target: RayTarget) -> Result<BlockEdit, WorldError> {
        let position = target
            .place_position
            .ok_or(WorldError::CoordinateOverflow(target.block))?;
        if self.player.bounding_box().intersects(&BoundingBox::block(position)) {
            return Err(WorldError::ObstructedByPlayer(position));
        }
        let block_type = self.player.selected_block;
        self.world.place_block(position, block_type)?;
        Ok(BlockEdit::Placed(position, block_type))
    }

    /// The block under the crosshair after the last step.
    pub fn target(&self) -> Option<RayTarget> {
        self.target
    }

    /// Blocks to draw, from the last step.
    pub fn visible_blocks(&self) -> &[BlockView] {
        self.visibility.visible_blocks()
    }

    /// Captures the player's modifications and pose.
    pub fn save_payload(&self) -> SavePayload {
        SavePayload {
            seed: self.world.generator().seed(),
            modifications: self
                .world
                .modifications()
                .into_iter()
                .map(|(position, modification)| ModificationRecord::new(position, modification))
                .collect(),
            player: PlayerPose {
                position: self.player.position.into(),
                yaw: self.player.camera.yaw.0,
                pitch: self.player.camera.pitch.0,
            },
        }
    }

    /// Replays a save over the current world and moves the player to the
    /// saved pose.
    ///
    /// # Arguments
    /// * `payload` - A save read by [`persistence::load_from_path`] or
    ///   produced by [`EngineState::save_payload`]
    ///
    /// A seed mismatch is logged and the save is applied anyway. The area
    /// around the restored player is loaded before this returns.
    pub fn restore(&mut self, payload: &SavePayload) {
        let seed = self.world.generator().seed();
        if payload.seed != seed {
            log::warn!(
                "Save was made with seed {} but the world uses seed {}",
                payload.seed,
                seed
            );
        }
        self.world
            .apply_modifications(payload.modifications.iter().map(ModificationRecord::entry));

        self.player.position = Point3::from(payload.player.position);
        self.player.velocity = Vector3::zero();
        self.player.grounded = false;
        self.player
            .camera
            .set_orientation(Deg(payload.player.yaw), Deg(payload.player.pitch));
        self.player.sync_camera();
        self.target = None;

        let chunk = chunk_coord_of(block_coord_of(self.player.position));
        if let Err(e) = self.world.load_area_blocking(chunk, SPAWN_AREA_RADIUS) {
            log::warn!("Area around restored player incomplete: {}", e);
        }
        log::info!(
            "Restored {} modifications, player at {:?}",
            payload.modifications.len(),
            self.player.position
        );
    }

    /// Stops chunk streaming.
    pub fn shutdown(&mut self) {
        self.world.shutdown();
    }
}

/// Represents player actions derived from input
///
/// This struct contains flags for the actions a step acts on: movement,
/// camera control and block interaction.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PlayerAction {
    /// Walk forward while true
    pub move_forward: bool,
    /// Walk backward while true
    pub move_backward: bool,
    /// Strafe left while true
    pub move_left: bool,
    /// Strafe right while true
    pub move_right: bool,
    /// Jump when standing on something
    pub jump: bool,
    /// Double movement speed
    pub sprint: bool,

    /// View rotation in look-input units
    pub rotate_view: Option<(f64, f64)>,

    /// Keep breaking the targeted block
    pub break_block: bool,
    /// Place a block in front of the targeted face; only set on press
    pub place_block: bool,
    /// Change the block type used for placement
    pub select_block: Option<BlockType>,
}

impl PlayerAction {
    /// Movement intent for the physics step.
    pub fn movement_input(&self) -> MovementInput {
        let axis = |positive: bool, negative: bool| positive as i8 as f32 - negative as i8 as f32;
        MovementInput {
            forward: axis(self.move_forward, self.move_backward),
            strafe: axis(self.move_right, self.move_left),
            jump: self.jump,
            sprint: self.sprint,
        }
    }
}
