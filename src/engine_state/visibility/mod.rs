//! # Visibility
//!
//! Produces the per-step set of blocks a renderer would draw.
//!
//! ## Passes
//! 1. **Occlusion**: face masks are recomputed for chunks marked dirty by the
//!    chunk store. Blocks with no drawable face are occluded.
//! 2. **Frustum culling**: each resident chunk's box is tested against the
//!    view frustum. A chunk containing the eye is always kept.
//!
//! The output is a flat list of [`BlockView`] records, sorted by position,
//! along with [`VisibilityStats`]. `BlockView` is plain old data so the list
//! can be handed to a GPU buffer as bytes.

use bytemuck::{Pod, Zeroable};
use cgmath::{Matrix4, Point3};

use crate::engine_state::voxels::block::Block;
use crate::engine_state::voxels::chunk::{chunk_origin, CHUNK_DIMENSION};
use crate::engine_state::voxels::chunk_store::ChunkStore;

pub mod frustum;
pub mod occlusion;

use frustum::Frustum;

/// One visible block, packed for upload.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct BlockView {
    /// World block coordinate
    pub position: [i32; 3],
    /// `BlockType` discriminant
    pub kind: u8,
    /// Drawable faces, one bit per `BlockSide`
    pub faces: u8,
    /// 1 when the block is targeted by the player
    pub highlighted: u8,
    _padding: u8,
}

impl BlockView {
    /// Packs a block.
    pub fn from_block(block: &Block) -> Self {
        BlockView {
            position: [block.position.x, block.position.y, block.position.z],
            kind: block.block_type as u8,
            faces: block.faces.bits(),
            highlighted: block.highlighted as u8,
            _padding: 0,
        }
    }
}

/// Counts from the last visibility pass.
///
/// `total_blocks == visible_blocks + occluded_blocks + culled_blocks`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilityStats {
    /// Blocks in resident chunks
    pub total_blocks: usize,
    /// Blocks in the output list
    pub visible_blocks: usize,
    /// Blocks in kept chunks with no drawable face
    pub occluded_blocks: usize,
    /// Blocks in chunks outside the frustum
    pub culled_blocks: usize,
    /// Chunks that passed the frustum test
    pub visible_chunks: usize,
    /// Chunks rejected by the frustum test
    pub culled_chunks: usize,
}

/// World-space box of a chunk: block centers run from the origin to
/// origin + 15, and each block extends half a unit past its center.
pub fn chunk_bounds(coordinate: Point3<i32>) -> Option<(Point3<f32>, Point3<f32>)> {
    let origin = chunk_origin(coordinate)?;
    let min = Point3::new(origin.x as f32 - 0.5, origin.y as f32 - 0.5, origin.z as f32 - 0.5);
    let extent = CHUNK_DIMENSION as f32;
    Some((min, Point3::new(min.x + extent, min.y + extent, min.z + extent)))
}

fn contains(min: Point3<f32>, max: Point3<f32>, point: Point3<f32>) -> bool {
    (min.x..=max.x).contains(&point.x)
        && (min.y..=max.y).contains(&point.y)
        && (min.z..=max.z).contains(&point.z)
}

/// Runs the occlusion and frustum passes and keeps their output.
#[derive(Debug, Default)]
pub struct VisibilitySystem {
    visible: Vec<BlockView>,
    stats: VisibilityStats,
}

impl VisibilitySystem {
    /// Creates a system with an empty visible set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the visible set for a camera.
    pub fn update(
        &mut self,
        store: &mut ChunkStore,
        view_projection: &Matrix4<f32>,
        eye: Point3<f32>,
    ) -> VisibilityStats {
        occlusion::recompute_dirty(store);

        let frustum = Frustum::from_matrix(view_projection);
        let mut stats = VisibilityStats::default();
        self.visible.clear();

        for chunk in store.chunks() {
            stats.total_blocks += chunk.len();
            let keep = match chunk_bounds(chunk.position) {
                Some((min, max)) => contains(min, max, eye) || frustum.intersects_aabb(min, max),
                None => false,
            };
            if !keep {
                stats.culled_chunks += 1;
                stats.culled_blocks += chunk.len();
                continue;
            }

            stats.visible_chunks += 1;
            for block in chunk.blocks() {
                if block.is_occluded() {
                    stats.occluded_blocks += 1;
                } else {
                    self.visible.push(BlockView::from_block(block));
                }
            }
        }

        self.visible.sort_unstable_by_key(|view| view.position);
        stats.visible_blocks = self.visible.len();
        self.stats = stats;
        stats
    }

    /// Blocks from the last pass, sorted by position.
    pub fn visible_blocks(&self) -> &[BlockView] {
        &self.visible
    }

    /// The visible set as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.visible)
    }

    /// Counts from the last pass.
    pub fn stats(&self) -> VisibilityStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::camera_state::{
        camera::{Camera, Projection},
        CameraState,
    };
    use crate::engine_state::voxels::block::block_type::BlockType;
    use crate::engine_state::voxels::chunk::Chunk;
    use cgmath::Deg;

    fn camera_at(position: Point3<f32>, yaw: f32) -> CameraState {
        CameraState::new(
            Camera::new(position, Deg(yaw), Deg(0.0)),
            Projection::new(100, 100, Deg(70.0), 0.1, 200.0),
        )
    }

    fn store_with_two_chunks() -> ChunkStore {
        let mut store = ChunkStore::new();
        for z in [-1, 1] {
            let coordinate = Point3::new(0, 0, z);
            store.insert_chunk(Chunk::empty(coordinate));
            let origin = chunk_origin(coordinate).unwrap();
            store
                .place_block(Point3::new(origin.x + 8, 8, origin.z + 8), BlockType::STONE)
                .unwrap();
        }
        store
    }

    #[test]
    fn block_view_is_twelve_plus_four_bytes() {
        assert_eq!(std::mem::size_of::<BlockView>(), 16);
    }

    #[test]
    fn chunks_behind_the_camera_are_culled() {
        let mut store = store_with_two_chunks();
        let mut visibility = VisibilitySystem::new();
        // Yaw 0 looks toward -Z.
        let camera = camera_at(Point3::new(8.0, 8.0, 8.0), 0.0);
        let stats = visibility.update(&mut store, &camera.view_projection(), camera.camera.position);

        assert_eq!(stats.total_blocks, 2);
        assert_eq!(stats.visible_blocks, 1);
        assert_eq!(stats.culled_blocks, 1);
        assert_eq!(stats.visible_chunks, 1);
        assert_eq!(visibility.visible_blocks()[0].position, [8, 8, -8]);
        assert_eq!(visibility.as_bytes().len(), 16);
    }

    #[test]
    fn chunk_containing_the_eye_is_kept() {
        let mut store = ChunkStore::new();
        store.insert_chunk(Chunk::empty(Point3::new(0, 0, 0)));
        // Behind the camera but in the same chunk.
        store.place_block(Point3::new(8, 8, 14), BlockType::DIRT).unwrap();
        let mut visibility = VisibilitySystem::new();
        let camera = camera_at(Point3::new(8.0, 8.0, 2.0), 0.0);
        let stats = visibility.update(&mut store, &camera.view_projection(), camera.camera.position);
        assert_eq!(stats.visible_chunks, 1);
        assert_eq!(stats.visible_blocks, 1);
    }

    #[test]
    fn stats_add_up() {
        let mut store = ChunkStore::new();
        store.insert_chunk(Chunk::empty(Point3::new(0, 0, -1)));
        for x in 0..3 {
            for y in 0..3 {
                for z in -3..0 {
                    store.place_block(Point3::new(x, y, z), BlockType::STONE).unwrap();
                }
            }
        }
        let mut visibility = VisibilitySystem::new();
        let camera = camera_at(Point3::new(1.0, 1.0, 10.0), 0.0);
        let stats = visibility.update(&mut store, &camera.view_projection(), camera.camera.position);
        assert_eq!(stats.total_blocks, 27);
        assert_eq!(stats.occluded_blocks, 1);
        assert_eq!(
            stats.total_blocks,
            stats.visible_blocks + stats.occluded_blocks + stats.culled_blocks
        );
    }
}
