//! pano_gpu - wgpu rendering layer for the panorama viewer.
//!
//! Owns the device/surface context, texture upload, the inward-facing sphere
//! mesh and the render pipeline that draws it through a perspective camera.

pub mod bindings;
pub mod config;
pub mod context;
pub mod error;
pub mod mesh;
pub mod pipeline;
pub mod texture;
pub mod uniform;

pub use config::{ClearColor, GpuConfig, RenderConfig, TextureConfig};
pub use context::GpuContext;
pub use error::{GpuError, Result};
pub use mesh::{SphereMesh, SphereVertex};
pub use pipeline::SpherePipeline;
pub use texture::Texture;
pub use uniform::CameraUniform;
