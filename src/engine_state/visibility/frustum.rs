//! View frustum extraction and box tests.
//!
//! Planes are pulled straight out of a combined view-projection matrix
//! (Gribb and Hartmann), assuming clip depth in `[-1, 1]`. Normals point into
//! the frustum and are unit length.

use cgmath::{InnerSpace, Matrix4, Point3, Vector3, Vector4};

/// A plane `normal · p + distance = 0`, positive on the inside.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane {
    /// Unit normal pointing into the frustum
    pub normal: Vector3<f32>,
    /// Offset from the origin along the normal
    pub distance: f32,
}

impl Plane {
    fn from_row(row: Vector4<f32>) -> Self {
        let normal = row.truncate();
        let length = normal.magnitude();
        if length > 0.0 {
            Plane {
                normal: normal / length,
                distance: row.w / length,
            }
        } else {
            Plane {
                normal,
                distance: row.w,
            }
        }
    }

    /// Signed distance of a point from the plane.
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(Vector3::new(point.x, point.y, point.z)) + self.distance
    }
}

/// Six inward-facing planes: left, right, bottom, top, near, far.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frustum {
    /// The bounding planes
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extracts the frustum of a view-projection matrix.
    pub fn from_matrix(matrix: &Matrix4<f32>) -> Self {
        // cgmath matrices are column major; row i is column[i] of each column.
        let row = |i: usize| Vector4::new(matrix.x[i], matrix.y[i], matrix.z[i], matrix.w[i]);
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));
        Frustum {
            planes: [
                Plane::from_row(r3 + r0),
                Plane::from_row(r3 - r0),
                Plane::from_row(r3 + r1),
                Plane::from_row(r3 - r1),
                Plane::from_row(r3 + r2),
                Plane::from_row(r3 - r2),
            ],
        }
    }

    /// Whether the box could be visible.
    ///
    /// Tests the corner farthest along each plane's normal, so boxes that
    /// straddle a plane are kept. Corner cases near the frustum edges may be
    /// accepted even if they are just outside.
    pub fn intersects_aabb(&self, min: Point3<f32>, max: Point3<f32>) -> bool {
        self.planes.iter().all(|plane| {
            let positive = Point3::new(
                if plane.normal.x >= 0.0 { max.x } else { min.x },
                if plane.normal.y >= 0.0 { max.y } else { min.y },
                if plane.normal.z >= 0.0 { max.z } else { min.z },
            );
            plane.signed_distance(positive) >= 0.0
        })
    }

    /// Whether a point lies inside every plane.
    pub fn contains_point(&self, point: Point3<f32>) -> bool {
        self.planes.iter().all(|plane| plane.signed_distance(point) >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::camera_state::{
        camera::{Camera, Projection},
        CameraState,
    };
    use cgmath::Deg;

    fn looking_down_negative_z() -> Frustum {
        let state = CameraState::new(
            Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(0.0), Deg(0.0)),
            Projection::new(100, 100, Deg(90.0), 0.1, 100.0),
        );
        Frustum::from_matrix(&state.view_projection())
    }

    #[test]
    fn planes_are_normalized() {
        for plane in looking_down_negative_z().planes {
            assert!((plane.normal.magnitude() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn boxes_in_front_pass_and_behind_fail() {
        let frustum = looking_down_negative_z();
        assert!(frustum.contains_point(Point3::new(0.0, 0.0, -10.0)));
        assert!(!frustum.contains_point(Point3::new(0.0, 0.0, 10.0)));
        assert!(frustum.intersects_aabb(Point3::new(-1.0, -1.0, -11.0), Point3::new(1.0, 1.0, -9.0)));
        assert!(!frustum.intersects_aabb(Point3::new(-1.0, -1.0, 9.0), Point3::new(1.0, 1.0, 11.0)));
        assert!(!frustum.intersects_aabb(Point3::new(-1.0, -1.0, -300.0), Point3::new(1.0, 1.0, -200.0)));
    }

    #[test]
    fn straddling_boxes_are_kept() {
        let frustum = looking_down_negative_z();
        // Crosses the left plane x = z.
        assert!(frustum.intersects_aabb(Point3::new(-30.0, -1.0, -11.0), Point3::new(-9.0, 1.0, -9.0)));
    }
}
