//! # Block Type Module
//!
//! This module defines the closed set of block types in the voxel world and
//! the static property table that gives each of them its physical behavior.
//! Air is not a block type: an empty cell simply has no block.

use serde::{Deserialize, Serialize};

use super::BlockTypeSize;

/// Enumerates all possible block types in the voxel world.
///
/// The discriminant indexes [`BLOCK_PROPERTIES`], so the table and the enum
/// must stay in the same order.
#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    /// A basic dirt block, found just under the surface.
    DIRT,

    /// A grass block, the top layer of the terrain.
    GRASS,

    /// Stone, the bulk of the terrain below the dirt layer.
    STONE,

    /// The unbreakable floor of the world at Y = 0.
    BEDROCK,

    /// A wooden block with a bark texture on all sides.
    WOOD,

    /// Foliage; does not hide the faces behind it.
    LEAVES,

    /// Transparent glass.
    GLASS,
}

/// Physical properties shared by every block of one type.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlockProperties {
    /// Whether the block hides the faces of its neighbors.
    pub opaque: bool,
    /// Seconds of continuous breaking needed to destroy the block.
    /// `f32::INFINITY` means the block is unbreakable.
    pub break_time: f32,
}

impl BlockProperties {
    /// Whether the block can be destroyed at all.
    pub fn breakable(&self) -> bool {
        self.break_time.is_finite()
    }
}

/// Property table indexed by `BlockType as usize`.
pub static BLOCK_PROPERTIES: [BlockProperties; BlockType::COUNT] = [
    BlockProperties { opaque: true, break_time: 0.5 },            // DIRT
    BlockProperties { opaque: true, break_time: 0.6 },            // GRASS
    BlockProperties { opaque: true, break_time: 1.5 },            // STONE
    BlockProperties { opaque: true, break_time: f32::INFINITY },  // BEDROCK
    BlockProperties { opaque: true, break_time: 1.0 },            // WOOD
    BlockProperties { opaque: false, break_time: 0.2 },           // LEAVES
    BlockProperties { opaque: false, break_time: 0.3 },           // GLASS
];

impl BlockType {
    /// Number of block types.
    pub const COUNT: usize = 7;

    /// Returns an array containing every block type, in discriminant order.
    pub fn all() -> [BlockType; Self::COUNT] {
        [
            BlockType::DIRT,
            BlockType::GRASS,
            BlockType::STONE,
            BlockType::BEDROCK,
            BlockType::WOOD,
            BlockType::LEAVES,
            BlockType::GLASS,
        ]
    }

    /// Converts a `BlockTypeSize` back to a `BlockType`.
    ///
    /// Returns `None` for values that don't name a block type.
    pub fn from_int(btype: BlockTypeSize) -> Option<Self> {
        Self::all().get(btype as usize).copied()
    }

    /// Looks up the static properties of this block type.
    pub fn properties(self) -> &'static BlockProperties {
        &BLOCK_PROPERTIES[self as usize]
    }

    /// Whether blocks of this type hide the faces of their neighbors.
    pub fn is_opaque(self) -> bool {
        self.properties().opaque
    }

    /// Seconds needed to break a block of this type.
    pub fn break_time(self) -> f32 {
        self.properties().break_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_conversion_round_trips() {
        for block_type in BlockType::all() {
            assert_eq!(BlockType::from_int(block_type as BlockTypeSize), Some(block_type));
        }
        assert_eq!(BlockType::from_int(BlockType::COUNT as BlockTypeSize), None);
    }

    #[test]
    fn bedrock_is_the_only_unbreakable_type() {
        let unbreakable: Vec<_> = BlockType::all()
            .into_iter()
            .filter(|t| !t.properties().breakable())
            .collect();
        assert_eq!(unbreakable, vec![BlockType::BEDROCK]);
    }

    #[test]
    fn see_through_types_are_not_opaque() {
        assert!(!BlockType::GLASS.is_opaque());
        assert!(!BlockType::LEAVES.is_opaque());
        assert!(BlockType::STONE.is_opaque());
    }
}
