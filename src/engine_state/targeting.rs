//! # Block Targeting
//!
//! Finds the block the player is looking at by marching a ray from the eye
//! in fixed steps. The first sample that lands in a solid cell is the target.
//! The face that was hit is read off the previous sample's offset from the
//! target's center, and the placement cell is the neighbor across that face.

use cgmath::{Deg, InnerSpace, Point3, Vector3};

use crate::engine_state::camera_state::camera::view_direction;
use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::chunk::block_coord_of;
use crate::engine_state::voxels::chunk_store::ChunkStore;

/// A block hit by the targeting ray.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RayTarget {
    /// The solid block that was hit
    pub block: Point3<i32>,
    /// The face of `block` the ray entered through
    pub face: BlockSide,
    /// The empty cell in front of `face`, where a new block would go.
    /// `None` if that cell is outside the addressable world.
    pub place_position: Option<Point3<i32>>,
}

fn block_center(position: Point3<i32>) -> Point3<f32> {
    Point3::new(position.x as f32, position.y as f32, position.z as f32)
}

/// Marches a ray from `origin` along `direction`.
///
/// The cell that contains `origin` is never a target.
///
/// # Arguments
/// * `store` - Blocks to test; chunks that are not resident read as air
/// * `origin` - Eye position the ray starts from
/// * `direction` - Any non-zero vector; it is normalized first
/// * `max_distance` - Reach in blocks
/// * `step` - Spacing of the samples in blocks
///
/// # Returns
/// The first solid block sampled, with the face it was entered through, or
/// `None` if nothing solid is in reach, the direction is zero or `step` is not
/// positive.
///
/// # Performance
/// Takes `max_distance / step` samples at most, one store lookup each.
pub fn cast_ray(
    store: &ChunkStore,
    origin: Point3<f32>,
    direction: Vector3<f32>,
    max_distance: f32,
    step: f32,
) -> Option<RayTarget> {
    if direction.magnitude2() == 0.0 || !step.is_finite() || step <= 0.0 {
        return None;
    }
    let direction = direction.normalize();
    let origin_cell = block_coord_of(origin);
    let samples = (max_distance / step).floor() as u32;

    let mut previous = origin;
    for i in 1..=samples {
        let sample = origin + direction * (step * i as f32);
        let cell = block_coord_of(sample);
        if cell != origin_cell && store.is_solid(cell) {
            let face = BlockSide::from_center_offset(previous - block_center(cell));
            let normal = face.normal();
            let place_position = (|| {
                Some(Point3::new(
                    cell.x.checked_add(normal.x)?,
                    cell.y.checked_add(normal.y)?,
                    cell.z.checked_add(normal.z)?,
                ))
            })();
            return Some(RayTarget {
                block: cell,
                face,
                place_position,
            });
        }
        previous = sample;
    }
    None
}

/// Marches a ray from `origin` in the direction a camera with `yaw` and
/// `pitch` would look.
///
/// The direction is `(sin yaw cos pitch, -sin pitch, -cos yaw cos pitch)`, so
/// yaw 0 looks down -Z and pitch 90 looks straight down. See [`cast_ray`] for
/// the remaining arguments.
pub fn cast_ray_from_angles(
    store: &ChunkStore,
    origin: Point3<f32>,
    yaw: Deg<f32>,
    pitch: Deg<f32>,
    max_distance: f32,
    step: f32,
) -> Option<RayTarget> {
    cast_ray(store, origin, view_direction(yaw, pitch), max_distance, step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::camera_state::camera::Camera;
    use crate::engine_state::voxels::block::block_type::BlockType;
    use crate::engine_state::voxels::chunk::Chunk;
    use cgmath::{Deg, EuclideanSpace};

    fn store_with(blocks: &[Point3<i32>]) -> ChunkStore {
        let mut store = ChunkStore::new();
        store.insert_chunk(Chunk::empty(Point3::new(0, 0, 0)));
        store.insert_chunk(Chunk::empty(Point3::new(0, 0, -1)));
        for block in blocks {
            store.place_block(*block, BlockType::STONE).unwrap();
        }
        store
    }

    #[test]
    fn looking_straight_down_hits_the_top_face() {
        let store = store_with(&[Point3::new(0, 5, 0)]);
        let target =
            cast_ray_from_angles(&store, Point3::new(0.0, 10.0, 0.0), Deg(0.0), Deg(90.0), 6.0, 0.05).unwrap();
        assert_eq!(target.block, Point3::new(0, 5, 0));
        assert_eq!(target.face, BlockSide::TOP);
        assert_eq!(target.place_position, Some(Point3::new(0, 6, 0)));
    }

    #[test]
    fn side_hits_report_the_entry_face() {
        let store = store_with(&[Point3::new(3, 2, 0)]);
        let toward_x = Camera::new(Point3::origin(), Deg(90.0), Deg(0.0)).get_view_vec();
        let target = cast_ray(&store, Point3::new(0.0, 2.0, 0.0), toward_x, 6.0, 0.05).unwrap();
        assert_eq!(target.block, Point3::new(3, 2, 0));
        assert_eq!(target.face, BlockSide::LEFT);
        assert_eq!(target.place_position, Some(Point3::new(2, 2, 0)));

        let same = cast_ray_from_angles(&store, Point3::new(0.0, 2.0, 0.0), Deg(90.0), Deg(0.0), 6.0, 0.05);
        assert_eq!(same, Some(target));
    }

    #[test]
    fn nothing_within_range_is_none() {
        let store = store_with(&[Point3::new(0, 0, -9)]);
        let forward = Vector3::new(0.0, 0.0, -1.0);
        assert!(cast_ray(&store, Point3::new(0.0, 0.0, 0.0), forward, 6.0, 0.05).is_none());
        assert!(cast_ray(&store, Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0), 6.0, 0.05).is_none());
    }

    #[test]
    fn the_eye_cell_is_skipped() {
        let store = store_with(&[Point3::new(0, 2, 0), Point3::new(0, 2, -2)]);
        let forward = Vector3::new(0.0, 0.0, -1.0);
        let target = cast_ray(&store, Point3::new(0.0, 2.0, 0.0), forward, 6.0, 0.05).unwrap();
        assert_eq!(target.block, Point3::new(0, 2, -2));
        assert_eq!(target.face, BlockSide::FRONT);
    }
}
