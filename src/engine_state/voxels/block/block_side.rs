//! # Block Side Module
//!
//! This module defines the six axis-aligned faces of a voxel block and the
//! compact bit mask used to record which of them are drawable.

use cgmath::Vector3;
use serde::{Deserialize, Serialize};

/// Represents the six possible faces of a voxel block.
///
/// Each variant is assigned a unique integer value which doubles as its bit
/// index inside a [`FaceMask`].
///
/// The order is: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
#[allow(clippy::upper_case_acronyms)]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, Serialize, Deserialize)]
pub enum BlockSide {
    /// The front face (facing positive Z)
    FRONT = 0,

    /// The back face (facing negative Z)
    BACK = 1,

    /// The bottom face (facing negative Y)
    BOTTOM = 2,

    /// The top face (facing positive Y)
    TOP = 3,

    /// The left face (facing negative X)
    LEFT = 4,

    /// The right face (facing positive X)
    RIGHT = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in a consistent order.
    ///
    /// The order is: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::LEFT,
            BlockSide::RIGHT,
        ]
    }

    /// The outward unit normal of this face, in block units.
    pub fn normal(self) -> Vector3<i32> {
        match self {
            BlockSide::FRONT => Vector3::new(0, 0, 1),
            BlockSide::BACK => Vector3::new(0, 0, -1),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
        }
    }

    /// Picks the face whose normal best matches an offset from a block center.
    ///
    /// The axis with the largest magnitude wins and its sign selects the face.
    /// Ties prefer X, then Y, then Z.
    pub fn from_center_offset(offset: Vector3<f32>) -> BlockSide {
        let (ax, ay, az) = (offset.x.abs(), offset.y.abs(), offset.z.abs());
        if ax >= ay && ax >= az {
            if offset.x >= 0.0 {
                BlockSide::RIGHT
            } else {
                BlockSide::LEFT
            }
        } else if ay >= az {
            if offset.y >= 0.0 {
                BlockSide::TOP
            } else {
                BlockSide::BOTTOM
            }
        } else if offset.z >= 0.0 {
            BlockSide::FRONT
        } else {
            BlockSide::BACK
        }
    }
}

/// One bit per [`BlockSide`]; a set bit means the face is drawable.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, Default)]
pub struct FaceMask(u8);

impl FaceMask {
    /// No face drawable.
    pub const NONE: FaceMask = FaceMask(0);
    /// Every face drawable.
    pub const ALL: FaceMask = FaceMask(0b0011_1111);

    /// Builds a mask from its raw bits, ignoring bits above the sixth.
    pub fn from_bits(bits: u8) -> Self {
        FaceMask(bits & Self::ALL.0)
    }

    /// The raw bits, in [`BlockSide`] order.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Marks `side` as drawable.
    pub fn insert(&mut self, side: BlockSide) {
        self.0 |= 1 << side as u8;
    }

    /// Whether `side` is drawable.
    pub fn contains(self, side: BlockSide) -> bool {
        self.0 & (1 << side as u8) != 0
    }

    /// `true` when no face is drawable, i.e. the block is fully occluded.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of drawable faces.
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Drawable faces in [`BlockSide::all`] order.
    pub fn sides(self) -> impl Iterator<Item = BlockSide> {
        BlockSide::all().into_iter().filter(move |side| self.contains(*side))
    }
}
