//! Render pipeline abstractions.

pub mod builder;
pub mod sphere;

pub use builder::{BindGroupLayoutBuilder, PipelineBuilder};
pub use sphere::SpherePipeline;
