//! # Chunk Module
//!
//! This module provides the `Chunk` struct and related functionality for managing
//! 16x16x16 blocks of voxel data, along with the coordinate conversions between
//! continuous world space, block coordinates and chunk coordinates.
//!
//! ## Sparse Storage
//!
//! Chunks only store the blocks that exist; an absent block is air:
//! - `solid_array`: A bit vector (1 bit per cell) indicating which cells hold a block
//! - `blocks`: An ordered map from local index to the block stored there
//!
//! ### Performance Characteristics
//! - **Occupancy Check**: O(1) - Just check the bit in `solid_array`
//! - **Block Lookup**: O(log n) in the number of stored blocks
//! - **Memory Usage**: 1 bit per cell + one map entry per non-air block

use std::collections::BTreeMap;

use bitvec::prelude::BitVec;
use cgmath::Point3;

use super::block::Block;

pub mod chunk_creation;

/// The dimension (width, height, depth) of a chunk in blocks.
pub const CHUNK_DIMENSION: i32 = 16;
/// The number of blocks in a single 2D plane of a chunk (CHUNK_DIMENSION²).
pub const CHUNK_PLANE_SIZE: i32 = CHUNK_DIMENSION * CHUNK_DIMENSION;
/// The total number of blocks in a chunk (CHUNK_DIMENSION³).
pub const CHUNK_SIZE: usize = (CHUNK_PLANE_SIZE * CHUNK_DIMENSION) as usize;

/// Chunk coordinate containing a world block position (floor division).
pub fn chunk_coord_of(world: Point3<i32>) -> Point3<i32> {
    Point3::new(
        world.x.div_euclid(CHUNK_DIMENSION),
        world.y.div_euclid(CHUNK_DIMENSION),
        world.z.div_euclid(CHUNK_DIMENSION),
    )
}

/// Position of a world block inside its chunk, each axis in `0..CHUNK_DIMENSION`.
pub fn local_coord_of(world: Point3<i32>) -> Point3<usize> {
    Point3::new(
        world.x.rem_euclid(CHUNK_DIMENSION) as usize,
        world.y.rem_euclid(CHUNK_DIMENSION) as usize,
        world.z.rem_euclid(CHUNK_DIMENSION) as usize,
    )
}

/// The block whose center is nearest to a continuous point, `floor(x + 0.5)` per axis.
pub fn block_coord_of(point: Point3<f32>) -> Point3<i32> {
    Point3::new(
        (point.x + 0.5).floor() as i32,
        (point.y + 0.5).floor() as i32,
        (point.z + 0.5).floor() as i32,
    )
}

/// World position of the block at local (0, 0, 0) of a chunk.
///
/// Returns `None` when the chunk lies outside the 32-bit block range.
pub fn chunk_origin(chunk: Point3<i32>) -> Option<Point3<i32>> {
    Some(Point3::new(
        chunk.x.checked_mul(CHUNK_DIMENSION)?,
        chunk.y.checked_mul(CHUNK_DIMENSION)?,
        chunk.z.checked_mul(CHUNK_DIMENSION)?,
    ))
}

/// Largest per-axis distance between two chunk coordinates.
pub fn chebyshev_distance(a: Point3<i32>, b: Point3<i32>) -> i64 {
    let dx = (a.x as i64 - b.x as i64).abs();
    let dy = (a.y as i64 - b.y as i64).abs();
    let dz = (a.z as i64 - b.z as i64).abs();
    dx.max(dy).max(dz)
}

/// Represents a 16x16x16 collection of voxel blocks in the world.
///
/// Chunks are the unit of generation and streaming. Each chunk knows its own
/// chunk coordinate, and every block it stores lies inside that coordinate.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    pub position: Point3<i32>,

    /// One bit per cell, set when the cell holds a block.
    ///
    /// Bits are in row-major order (x, then y, then z), matching [`Chunk::local_index`].
    solid_array: BitVec,

    /// The blocks of this chunk keyed by local index. Only non-air cells appear.
    blocks: BTreeMap<u16, Block>,
}

impl Chunk {
    /// Creates a new, completely empty chunk (all cells are air).
    pub fn empty(position: Point3<i32>) -> Self {
        let mut solid_array = BitVec::with_capacity(CHUNK_SIZE);
        solid_array.resize(CHUNK_SIZE, false);
        Chunk {
            position,
            solid_array,
            blocks: BTreeMap::new(),
        }
    }

    /// Index of a local position in `solid_array` and `blocks`.
    pub fn local_index(cx: usize, cy: usize, cz: usize) -> usize {
        cx + CHUNK_DIMENSION as usize * cy + CHUNK_PLANE_SIZE as usize * cz
    }

    /// Whether a world position falls inside this chunk.
    pub fn contains(&self, world: Point3<i32>) -> bool {
        chunk_coord_of(world) == self.position
    }

    /// Checks if the cell at the specified chunk-relative coordinates holds a block.
    ///
    /// # Panics
    /// Panics if a coordinate is not below `CHUNK_DIMENSION`.
    pub fn is_block_solid(&self, cx: usize, cy: usize, cz: usize) -> bool {
        self.solid_array[Self::local_index(cx, cy, cz)]
    }

    /// Gets the block at chunk-relative coordinates, or `None` for air.
    pub fn get_block_at(&self, cx: usize, cy: usize, cz: usize) -> Option<&Block> {
        if !self.is_block_solid(cx, cy, cz) {
            return None;
        }
        self.blocks.get(&(Self::local_index(cx, cy, cz) as u16))
    }

    /// Gets the block at a world position, or `None` for air or a position
    /// belonging to another chunk.
    pub fn get_block(&self, world: Point3<i32>) -> Option<&Block> {
        if !self.contains(world) {
            return None;
        }
        let local = local_coord_of(world);
        self.get_block_at(local.x, local.y, local.z)
    }

    /// Mutable variant of [`Chunk::get_block`].
    pub fn get_block_mut(&mut self, world: Point3<i32>) -> Option<&mut Block> {
        if !self.contains(world) {
            return None;
        }
        let local = local_coord_of(world);
        self.blocks
            .get_mut(&(Self::local_index(local.x, local.y, local.z) as u16))
    }

    /// Stores a block at its own position, returning the block it replaced.
    ///
    /// The block must belong to this chunk. That is checked in debug builds;
    /// release builds log and drop a misplaced block.
    pub fn set_block(&mut self, block: Block) -> Option<Block> {
        debug_assert!(
            self.contains(block.position),
            "block at {:?} does not belong to chunk {:?}",
            block.position,
            self.position
        );
        if !self.contains(block.position) {
            log::error!(
                "Dropped block at {:?}: outside chunk {:?}",
                block.position,
                self.position
            );
            return None;
        }
        let local = local_coord_of(block.position);
        let index = Self::local_index(local.x, local.y, local.z);
        self.solid_array.set(index, true);
        self.blocks.insert(index as u16, block)
    }

    /// Removes and returns the block at a world position.
    pub fn remove_block(&mut self, world: Point3<i32>) -> Option<Block> {
        if !self.contains(world) {
            return None;
        }
        let local = local_coord_of(world);
        let index = Self::local_index(local.x, local.y, local.z);
        self.solid_array.set(index, false);
        self.blocks.remove(&(index as u16))
    }

    /// Iterates over the stored blocks in local index order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// Mutable iteration over the stored blocks in local index order.
    pub fn blocks_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.blocks.values_mut()
    }

    /// Number of non-air blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// `true` when the chunk holds only air.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockType;

    #[test]
    fn coordinates_floor_toward_negative_infinity() {
        assert_eq!(chunk_coord_of(Point3::new(0, 15, 16)), Point3::new(0, 0, 1));
        assert_eq!(chunk_coord_of(Point3::new(-1, -16, -17)), Point3::new(-1, -1, -2));
        assert_eq!(local_coord_of(Point3::new(-1, -16, -17)), Point3::new(15, 0, 15));
    }

    #[test]
    fn block_coord_rounds_to_nearest_center() {
        assert_eq!(block_coord_of(Point3::new(0.49, -0.49, 5.5)), Point3::new(0, 0, 6));
        assert_eq!(block_coord_of(Point3::new(-0.51, 1.2, -2.6)), Point3::new(-1, 1, -3));
    }

    #[test]
    fn origin_overflow_is_detected() {
        assert_eq!(chunk_origin(Point3::new(1, -2, 0)), Some(Point3::new(16, -32, 0)));
        assert_eq!(chunk_origin(Point3::new(i32::MAX, 0, 0)), None);
    }

    #[test]
    fn set_get_remove_block() {
        let mut chunk = Chunk::empty(Point3::new(-1, 0, 0));
        let position = Point3::new(-3, 4, 5);
        assert!(chunk.set_block(Block::new(BlockType::STONE, position)).is_none());
        assert_eq!(chunk.len(), 1);

        let local = local_coord_of(position);
        assert!(chunk.is_block_solid(local.x, local.y, local.z));
        assert_eq!(chunk.get_block(position).map(|b| b.block_type), Some(BlockType::STONE));

        let removed = chunk.remove_block(position);
        assert_eq!(removed.map(|b| b.position), Some(position));
        assert!(chunk.get_block(position).is_none());
        assert!(!chunk.is_block_solid(local.x, local.y, local.z));
        assert!(chunk.is_empty());
    }

    #[test]
    fn lookups_outside_the_chunk_miss() {
        let mut chunk = Chunk::empty(Point3::new(0, 0, 0));
        chunk.set_block(Block::new(BlockType::DIRT, Point3::new(1, 1, 1)));
        assert!(chunk.get_block(Point3::new(17, 1, 1)).is_none());
        assert!(chunk.remove_block(Point3::new(17, 1, 1)).is_none());
    }

    #[test]
    fn chebyshev_distance_uses_largest_axis() {
        assert_eq!(chebyshev_distance(Point3::new(0, 0, 0), Point3::new(1, -3, 2)), 3);
    }
}
