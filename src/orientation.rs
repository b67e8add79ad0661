//! Camera orientation math.
//!
//! The camera sits at the center of the panorama sphere. Its orientation is
//! two angles: yaw around the vertical axis and pitch above/below the horizon.
//! All updates return a new `Orientation`, clamping pitch and field of view.

use glam::{Mat4, Vec3};

use crate::constants::{DEFAULT_FOV_DEG, MAX_FOV_DEG, MIN_FOV_DEG, PITCH_LIMIT, Z_FAR, Z_NEAR};

/// Direction of a discrete rotation step (arrow keys).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Camera yaw/pitch (radians) and vertical field of view (degrees).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
    pub fov_deg: f32,
}

impl Orientation {
    /// Create an orientation, clamping pitch and field of view.
    pub fn new(yaw: f32, pitch: f32, fov_deg: f32) -> Self {
        Self {
            yaw,
            pitch: clamp_pitch(pitch),
            fov_deg: clamp_fov(fov_deg),
        }
    }

    /// Looking along +x at the horizon with the default field of view.
    pub fn reset() -> Self {
        Self::new(0.0, 0.0, DEFAULT_FOV_DEG)
    }

    /// Same as [`Orientation::reset`] but with a custom field of view.
    pub fn reset_with_fov(fov_deg: f32) -> Self {
        Self::new(0.0, 0.0, fov_deg)
    }

    /// Apply a pointer delta in pixels.
    pub fn drag(&self, dx: f32, dy: f32, sensitivity: f32) -> Orientation {
        Orientation::new(
            self.yaw + dx * sensitivity,
            self.pitch + dy * sensitivity,
            self.fov_deg,
        )
    }

    /// Apply one keyboard step.
    pub fn step(&self, direction: StepDirection, step: f32) -> Orientation {
        let (dyaw, dpitch) = match direction {
            StepDirection::Left => (-step, 0.0),
            StepDirection::Right => (step, 0.0),
            StepDirection::Up => (0.0, -step),
            StepDirection::Down => (0.0, step),
        };
        Orientation::new(self.yaw + dyaw, self.pitch + dpitch, self.fov_deg)
    }

    /// Add `delta_deg` to the field of view. Yaw and pitch are untouched.
    pub fn zoom(&self, delta_deg: f32) -> Orientation {
        Orientation {
            fov_deg: clamp_fov(self.fov_deg + delta_deg),
            ..*self
        }
    }

    /// Unit vector the camera looks along.
    pub fn direction(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch)
    }

    /// Camera up vector: the derivative of [`Orientation::direction`] with
    /// respect to pitch. Always perpendicular to the direction, even at the poles.
    pub fn up(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(-cos_yaw * sin_pitch, cos_pitch, -sin_yaw * sin_pitch)
    }

    /// View matrix looking from the origin toward [`Orientation::direction`].
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(Vec3::ZERO, self.direction(), self.up())
    }

    /// Perspective projection for the given viewport aspect ratio.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        Mat4::perspective_rh(self.fov_deg.to_radians(), aspect, Z_NEAR, Z_FAR)
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::reset()
    }
}

pub fn clamp_pitch(pitch: f32) -> f32 {
    pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT)
}

pub fn clamp_fov(fov_deg: f32) -> f32 {
    fov_deg.clamp(MIN_FOV_DEG, MAX_FOV_DEG)
}
