//! Uniform types shared with the sphere shader.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Combined model-view-projection matrix for the panorama sphere.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self::from_matrix(Mat4::IDENTITY)
    }

    pub fn from_matrix(matrix: Mat4) -> Self {
        Self {
            view_proj: matrix.to_cols_array_2d(),
        }
    }

    /// Build the uniform from camera matrices and the sphere's yaw rotation.
    pub fn from_parts(projection: Mat4, view: Mat4, sphere_rotation: f32) -> Self {
        Self::from_matrix(projection * view * Mat4::from_rotation_y(sphere_rotation))
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}
