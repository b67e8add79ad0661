//! Global constants for the panorama viewer.
//!
//! Values here are the defaults; most of them can be overridden through
//! [`crate::config::ViewerTuning`] and [`crate::config::UploadLimits`].

use std::f32::consts::FRAC_PI_2;

/// Pitch limit in radians (looking straight up or down).
pub const PITCH_LIMIT: f32 = FRAC_PI_2;

/// Narrowest field of view, in degrees.
pub const MIN_FOV_DEG: f32 = 10.0;
/// Widest field of view, in degrees.
pub const MAX_FOV_DEG: f32 = 100.0;
/// Field of view after a reset, in degrees.
pub const DEFAULT_FOV_DEG: f32 = 75.0;

/// Radians of yaw/pitch per pixel of pointer movement.
pub const DRAG_SENSITIVITY: f32 = 0.01;
/// Radians per arrow keypress.
pub const KEY_STEP: f32 = 0.1;
/// Degrees of field of view per unit of wheel delta.
pub const WHEEL_SENSITIVITY: f32 = 0.05;
/// Degrees of field of view per pixel of pinch distance change.
pub const PINCH_SENSITIVITY: f32 = 0.1;
/// Wheel delta reported for one line of a line-based scroll wheel.
pub const PIXELS_PER_WHEEL_LINE: f32 = 100.0;
/// Pinch distance, in pixels, equivalent to a touchpad magnify delta of 1.0.
pub const PIXELS_PER_MAGNIFY: f32 = 100.0;

/// Auto-rotate speed; the sphere turns `speed * AUTO_ROTATE_STEP` radians per frame.
pub const DEFAULT_AUTO_ROTATE_SPEED: f32 = 0.5;
pub const AUTO_ROTATE_STEP: f32 = 0.01;

/// How long the drag flag survives a pointer release, in milliseconds.
pub const DRAG_RELEASE_GRACE_MS: u64 = 100;

/// Notifications disappear after this many milliseconds.
pub const NOTIFICATION_TIMEOUT_MS: u64 = 5000;

/// Interaction hint appears this long after startup, in milliseconds.
pub const HINT_DELAY_MS: u64 = 1000;
/// Interaction hint hides itself after this long, in milliseconds.
pub const HINT_DURATION_MS: u64 = 5000;

/// Accepted upload MIME types.
pub const SUPPORTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];
/// Upload size ceiling in bytes (50 MB).
pub const MAX_FILE_SIZE: u64 = 52_428_800;
/// Width / height of an equirectangular panorama.
pub const TARGET_ASPECT_RATIO: f32 = 2.0;
/// Allowed deviation from [`TARGET_ASPECT_RATIO`] before warning.
pub const ASPECT_RATIO_TOLERANCE: f32 = 0.1;

/// Directory preset panoramas are resolved against.
pub const DEFAULT_PRESET_DIR: &str = "panoramas";

/// Native window defaults.
pub mod window {
    pub const TITLE: &str = "3D просмотрщик панорам";
    pub const DEFAULT_SIZE: (u32, u32) = (1280, 720);
    pub const MIN_SIZE: (u32, u32) = (320, 240);
}

/// Camera clipping planes.
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 1000.0;
