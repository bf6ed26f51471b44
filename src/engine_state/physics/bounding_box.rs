//! Axis-aligned boxes for player and block collision.

use cgmath::{Point3, Vector3};

use crate::engine_state::voxels::chunk::block_coord_of;

/// An axis-aligned box in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Point3<f32>,
    /// Maximum corner
    pub max: Point3<f32>,
}

impl BoundingBox {
    /// A box of `size` centered on `center`.
    pub fn from_center(center: Point3<f32>, size: Vector3<f32>) -> Self {
        let half = size * 0.5;
        BoundingBox {
            min: center - half,
            max: center + half,
        }
    }

    /// The unit cube occupied by the block at `position`.
    pub fn block(position: Point3<i32>) -> Self {
        let center = Point3::new(position.x as f32, position.y as f32, position.z as f32);
        Self::from_center(center, Vector3::new(1.0, 1.0, 1.0))
    }

    /// The same box moved by `offset`.
    pub fn translated(&self, offset: Vector3<f32>) -> Self {
        BoundingBox {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Whether the interiors overlap. Touching faces do not count.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Whether the point lies inside or on the box.
    pub fn contains_point(&self, point: Point3<f32>) -> bool {
        (self.min.x..=self.max.x).contains(&point.x)
            && (self.min.y..=self.max.y).contains(&point.y)
            && (self.min.z..=self.max.z).contains(&point.z)
    }

    /// Every block cell the box could overlap.
    pub fn block_cells(&self) -> impl Iterator<Item = Point3<i32>> {
        let low = block_coord_of(self.min);
        let high = block_coord_of(self.max);
        (low.z..=high.z).flat_map(move |z| {
            (low.y..=high.y).flat_map(move |y| (low.x..=high.x).map(move |x| Point3::new(x, y, z)))
        })
    }
}
