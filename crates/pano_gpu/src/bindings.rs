//! Shader binding constants.
//!
//! These must match the `@group`/`@binding` attributes in `shaders/sphere.wgsl`.

/// Group 0: camera uniform.
pub const CAMERA_GROUP: u32 = 0;
pub const CAMERA_BINDING: u32 = 0;

/// Group 1: panorama texture and its sampler.
pub const TEXTURE_GROUP: u32 = 1;
pub const TEXTURE_BINDING: u32 = 0;
pub const SAMPLER_BINDING: u32 = 1;
