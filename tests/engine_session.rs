//! # Engine Session
//!
//! Drives a full engine through steps, saves its edits and restores them onto
//! fresh terrain.

use std::time::Duration;

use cgmath::Point3;
use voxel_world::application_state::input_state::{InputAction, InputTracker};
use voxel_world::application_state::settings::Settings;
use voxel_world::engine_state::persistence::{read_save, write_save};
use voxel_world::engine_state::voxels::block::block_type::BlockType;
use voxel_world::engine_state::EngineState;

const STEP: Duration = Duration::from_millis(50);

fn settings() -> Settings {
    Settings {
        seed: 42,
        render_distance: 1,
        worker_threads: Some(2),
        ..Settings::default()
    }
}

#[test]
fn visibility_counts_add_up_every_step() {
    let mut engine = EngineState::new(&settings());
    let mut tracker = InputTracker::new();
    tracker.set_held(InputAction::MoveForward, true);
    for _ in 0..30 {
        engine.set_input_commands(tracker.process());
        let stats = engine.step(STEP).stats;
        assert_eq!(
            stats.total_blocks,
            stats.visible_blocks + stats.occluded_blocks + stats.culled_blocks
        );
        assert_eq!(stats.visible_blocks, engine.visible_blocks().len());
    }
    assert!(engine.visible_blocks().windows(2).all(|w| w[0].position < w[1].position));
    engine.shutdown();
}

#[test]
fn bedrock_is_never_broken() {
    let mut engine = EngineState::new(&settings());
    let bedrock = Point3::new(0, 0, 0);
    engine.world.load_chunk_blocking(Point3::new(0, 0, 0)).unwrap();
    engine.player.position = Point3::new(0.0, 2.0, 0.0);
    engine.world.destroy_block(Point3::new(0, 1, 0)).ok();
    engine.world.destroy_block(Point3::new(0, 2, 0)).ok();
    engine.world.destroy_block(Point3::new(0, 3, 0)).ok();
    engine
        .player
        .camera
        .set_orientation(cgmath::Deg(0.0), cgmath::Deg(89.0));
    engine.player.sync_camera();

    let mut tracker = InputTracker::new();
    tracker.set_held(InputAction::BreakBlock, true);
    for _ in 0..100 {
        engine.set_input_commands(tracker.process());
        let report = engine.step(STEP);
        assert!(report.edits.is_empty());
    }
    assert_eq!(
        engine.world.get_block(bedrock).map(|b| b.block_type),
        Some(BlockType::BEDROCK)
    );
    engine.shutdown();
}

#[test]
fn restored_save_reproduces_block_lookups() {
    let mut original = EngineState::new(&settings());
    let generator_surface = |x, z| original.world.generator().surface_height(x, z);
    let removed = Point3::new(0, generator_surface(0, 0), 0);
    let placed = Point3::new(2, generator_surface(2, 2) + 1, 2);

    original.world.destroy_block(removed).unwrap();
    original.world.place_block(placed, BlockType::WOOD).unwrap();
    original.player.camera.set_orientation(cgmath::Deg(123.0), cgmath::Deg(-20.0));

    let mut bytes = Vec::new();
    write_save(&mut bytes, &original.save_payload()).unwrap();
    let payload = read_save(bytes.as_slice()).unwrap();
    assert_eq!(payload, original.save_payload());
    original.shutdown();

    let mut restored = EngineState::new(&settings());
    assert!(restored.world.get_block(removed).is_some());
    restored.restore(&payload);

    assert!(restored.world.get_block(removed).is_none());
    assert_eq!(
        restored.world.get_block(placed).map(|b| b.block_type),
        Some(BlockType::WOOD)
    );
    assert_eq!(restored.player.camera.yaw.0, 123.0);
    assert_eq!(restored.player.camera.pitch.0, -20.0);
    assert_eq!(restored.world.modifications().len(), 2);
    restored.shutdown();
}
