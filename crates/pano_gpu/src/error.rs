use thiserror::Error;

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("Failed to request adapter: {0}")]
    AdapterRequest(#[from] wgpu::RequestAdapterError),

    #[error("Failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("Failed to create surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    #[error("Surface has no supported texture format")]
    NoSurfaceFormat,

    #[error("Rendering context lost")]
    ContextLost,

    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("Texture error: {0}")]
    Texture(String),
}

pub type Result<T> = std::result::Result<T, GpuError>;
