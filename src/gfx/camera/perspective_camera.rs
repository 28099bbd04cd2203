use super::camera_utils::{convert_matrix4_to_array, CameraUniform};
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Perspective camera with a position and a look-at target
///
/// Y is up. The projection matrix is cached; call
/// [`PerspectiveCamera::update_projection_matrix`] after changing `fov`,
/// `aspect`, `near` or `far`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view
    pub fov: Deg<f32>,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vector3<f32>,
    pub up: Vector3<f32>,
    target: Vector3<f32>,
    projection: Matrix4<f32>,
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov: Deg(fov_degrees),
            aspect,
            near,
            far,
            position: Vector3::zero(),
            up: Vector3::unit_y(),
            target: -Vector3::unit_z(),
            projection: Matrix4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    /// Projection times view, in wgpu clip space
    pub fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.projection * self.view_matrix()
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vector3::new(x, y, z);
    }

    /// Orients the camera towards a world-space point
    pub fn look_at(&mut self, target: Vector3<f32>) {
        self.target = target;
    }

    /// The point the camera is oriented towards
    pub fn target(&self) -> Vector3<f32> {
        self.target
    }

    /// Unit vector the camera looks along
    pub fn forward(&self) -> Vector3<f32> {
        let direction = self.target - self.position;
        if direction.magnitude2() <= f32::EPSILON {
            -Vector3::unit_z()
        } else {
            direction.normalize()
        }
    }

    /// Camera-space X axis in world coordinates
    pub fn right(&self) -> Vector3<f32> {
        let right = self.forward().cross(self.up);
        if right.magnitude2() <= f32::EPSILON {
            Vector3::unit_x()
        } else {
            right.normalize()
        }
    }

    /// Camera-space Y axis in world coordinates
    pub fn camera_up(&self) -> Vector3<f32> {
        self.right().cross(self.forward()).normalize()
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = perspective(self.fov, self.aspect, self.near, self.far);
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.position);
        let center = Point3::from_vec(self.position + self.forward());
        Matrix4::look_at_rh(eye, center, self.camera_up())
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_position: [self.position.x, self.position.y, self.position.z, 1.0],
            view_proj: convert_matrix4_to_array(self.build_view_projection_matrix()),
        }
    }
}
