//! # Block Module
//!
//! This module provides the core block-related functionality for the voxel engine.
//! It includes block type definitions, block face handling, and the block value itself.

use block_side::FaceMask;
use block_type::BlockType;
use cgmath::Point3;

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in compact form.
pub type BlockTypeSize = u8;

/// Represents a single voxel block in the world.
///
/// Static properties (opacity, break time) are looked up from the block type;
/// the block itself only carries its identity and the transient state the
/// simulation attaches to it.
///
/// A block at `position` is the unit cube centered on that position.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Block {
    /// The type of this block.
    pub block_type: BlockType,
    /// World position of the block's center, in block coordinates.
    pub position: Point3<i32>,
    /// Set while the player's crosshair rests on this block.
    pub highlighted: bool,
    /// Fraction of the break time already spent breaking this block, in `0..=1`.
    pub break_progress: f32,
    /// Faces that are not hidden by an opaque neighbor.
    pub faces: FaceMask,
}

impl Block {
    /// Creates a new block of the specified type at a world position.
    ///
    /// All faces start out drawable until occlusion has been computed.
    pub fn new(block_type: BlockType, position: Point3<i32>) -> Self {
        Block {
            block_type,
            position,
            highlighted: false,
            break_progress: 0.0,
            faces: FaceMask::ALL,
        }
    }

    /// Whether this block hides the faces of its neighbors.
    pub fn is_opaque(&self) -> bool {
        self.block_type.is_opaque()
    }

    /// Seconds needed to break this block.
    pub fn break_time(&self) -> f32 {
        self.block_type.break_time()
    }

    /// Whether this block can be broken.
    pub fn is_breakable(&self) -> bool {
        self.block_type.properties().breakable()
    }

    /// `true` when occlusion hid every face of the block.
    pub fn is_occluded(&self) -> bool {
        self.faces.is_empty()
    }

    /// Adds `dt` seconds of breaking and reports whether the block is now broken.
    ///
    /// Unbreakable blocks never accumulate progress.
    pub fn advance_break(&mut self, dt: f32) -> bool {
        if !self.is_breakable() {
            return false;
        }
        self.break_progress = (self.break_progress + dt / self.break_time()).min(1.0);
        self.break_progress >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn break_progress_saturates_at_break_time() {
        let mut block = Block::new(BlockType::DIRT, Point3::new(0, 0, 0));
        assert!(!block.advance_break(0.25));
        assert!((block.break_progress - 0.5).abs() < 1e-6);
        assert!(block.advance_break(0.3));
        assert_eq!(block.break_progress, 1.0);
    }

    #[test]
    fn bedrock_never_breaks() {
        let mut block = Block::new(BlockType::BEDROCK, Point3::new(0, 0, 0));
        assert!(!block.advance_break(1000.0));
        assert_eq!(block.break_progress, 0.0);
    }
}
