//! # Camera Implementation
//!
//! This module contains the core camera implementation:
//! - `Camera`: The eye position and look orientation
//! - `Projection`: Perspective projection settings
//!
//! Angles are kept in degrees. Yaw 0 looks down -Z and grows toward +X.
//! Positive pitch looks down.

use cgmath::*;

/// Pitch is clamped to this many degrees either side of the horizon.
pub const PITCH_LIMIT_DEGREES: f32 = 89.0;

/// Unit look direction for a yaw and pitch.
///
/// Unlike [`Camera`], the pitch is not clamped, so 90 degrees looks straight
/// down.
pub fn view_direction(yaw: Deg<f32>, pitch: Deg<f32>) -> Vector3<f32> {
    let (yaw_sin, yaw_cos) = Rad::from(yaw).0.sin_cos();
    let (pitch_sin, pitch_cos) = Rad::from(pitch).0.sin_cos();
    Vector3::new(yaw_sin * pitch_cos, -pitch_sin, -yaw_cos * pitch_cos)
}

/// Represents a first-person camera in 3D space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// The camera's position in world space
    pub position: Point3<f32>,
    /// Horizontal rotation (around Y axis), in `[0, 360)`
    pub yaw: Deg<f32>,
    /// Vertical rotation, in `[-89, 89]`; positive looks down
    pub pitch: Deg<f32>,
}

impl Camera {
    /// Creates a new camera with the specified position and orientation.
    ///
    /// The orientation is normalized the same way [`Camera::rotate`] does it.
    ///
    /// # Example
    /// ```rust
    /// use cgmath::{Deg, Point3};
    /// use voxel_world::engine_state::camera_state::camera::Camera;
    ///
    /// let camera = Camera::new(Point3::new(0.0, 10.0, 0.0), Deg(-90.0), Deg(120.0));
    /// assert_eq!(camera.yaw, Deg(270.0));
    /// assert_eq!(camera.pitch, Deg(89.0));
    /// ```
    pub fn new<V: Into<Point3<f32>>, Y: Into<Deg<f32>>, P: Into<Deg<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        let mut camera = Self {
            position: position.into(),
            yaw: Deg(0.0),
            pitch: Deg(0.0),
        };
        camera.set_orientation(yaw.into(), pitch.into());
        camera
    }

    /// Sets yaw and pitch, wrapping yaw and clamping pitch.
    pub fn set_orientation(&mut self, yaw: Deg<f32>, pitch: Deg<f32>) {
        self.yaw = Deg(yaw.0.rem_euclid(360.0));
        self.pitch = Deg(pitch.0.clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES));
    }

    /// Adds look deltas, in degrees.
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.set_orientation(self.yaw + Deg(delta_yaw), self.pitch + Deg(delta_pitch));
    }

    /// Unit view direction.
    pub fn get_view_vec(&self) -> Vector3<f32> {
        view_direction(self.yaw, self.pitch)
    }

    /// Horizontal forward direction, ignoring pitch.
    pub fn forward(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = Rad::from(self.yaw).0.sin_cos();
        Vector3::new(yaw_sin, 0.0, -yaw_cos)
    }

    /// Horizontal right direction.
    pub fn right(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = Rad::from(self.yaw).0.sin_cos();
        Vector3::new(yaw_cos, 0.0, yaw_sin)
    }

    /// Calculates the view matrix for this camera.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.get_view_vec(), Vector3::unit_y())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Camera::new(Point3::origin(), Deg(0.0), Deg(0.0))
    }
}

/// Represents a camera's projection matrix and related parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Aspect ratio (width / height)
    aspect: f32,
    /// Vertical field of view in radians
    fovy: Rad<f32>,
    /// Near clipping plane distance
    znear: f32,
    /// Far clipping plane distance
    zfar: f32,
}

impl Projection {
    /// Creates a new projection with the given parameters.
    ///
    /// # Arguments
    /// * `width` - Viewport width in pixels
    /// * `height` - Viewport height in pixels
    /// * `fovy` - Vertical field of view (can be any type convertible to `Rad<f32>`)
    /// * `znear` - Near clipping plane distance
    /// * `zfar` - Far clipping plane distance
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        let mut projection = Self {
            aspect: 1.0,
            fovy: fovy.into(),
            znear,
            zfar,
        };
        projection.resize(width, height);
        projection
    }

    /// Updates the aspect ratio. A zero-sized viewport keeps the old ratio.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Width over height.
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Far clipping plane distance.
    pub fn zfar(&self) -> f32 {
        self.zfar
    }

    /// Calculates the projection matrix, with clip depth in `[-1, 1]`.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vector3<f32>, b: Vector3<f32>) {
        assert!((a - b).magnitude() < 1e-5, "{:?} != {:?}", a, b);
    }

    #[test]
    fn view_direction_follows_yaw_and_pitch() {
        let camera = Camera::new(Point3::origin(), Deg(0.0), Deg(0.0));
        assert_close(camera.get_view_vec(), Vector3::new(0.0, 0.0, -1.0));

        let camera = Camera::new(Point3::origin(), Deg(90.0), Deg(0.0));
        assert_close(camera.get_view_vec(), Vector3::new(1.0, 0.0, 0.0));
        assert_close(camera.right(), Vector3::new(0.0, 0.0, 1.0));

        let camera = Camera::new(Point3::origin(), Deg(0.0), Deg(89.0));
        assert!(camera.get_view_vec().y < -0.99);
    }

    #[test]
    fn pitch_clamps_and_yaw_wraps() {
        let mut camera = Camera::default();
        camera.rotate(-30.0, -200.0);
        assert_eq!(camera.yaw, Deg(330.0));
        assert_eq!(camera.pitch, Deg(-89.0));
        camera.rotate(400.0, 200.0);
        assert_eq!(camera.yaw, Deg(10.0));
        assert_eq!(camera.pitch, Deg(89.0));
    }

    #[test]
    fn view_matrix_moves_eye_to_origin() {
        let camera = Camera::new(Point3::new(3.0, 4.0, 5.0), Deg(45.0), Deg(10.0));
        let eye = camera.calc_matrix() * camera.position.to_homogeneous();
        assert!(eye.truncate().magnitude() < 1e-4);
    }

    #[test]
    fn zero_sized_viewport_keeps_aspect() {
        let mut projection = Projection::new(160, 90, Deg(70.0), 0.1, 100.0);
        projection.resize(0, 90);
        assert!((projection.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }
}
