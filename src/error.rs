//! Error types for the viewer.
//!
//! Every variant is recoverable: the controller turns it into a notification
//! and aborts only the operation that failed.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ViewerError {
    /// Declared MIME type is not in the allow-list.
    #[error("Unsupported format '{mime}' for {name}")]
    UnsupportedFormat { name: String, mime: String },

    /// File exceeds the upload size ceiling.
    #[error("File {name} is {size} bytes, limit is {limit}")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    /// Reading or decoding the image failed.
    #[error("Failed to decode {name}: {reason}")]
    DecodeFailure { name: String, reason: String },

    /// The GPU context went away; the last panorama is reloaded on restore.
    #[error("Rendering context lost")]
    RenderContextLost,

    /// Presets cannot be deleted.
    #[error("Preset panorama {0} cannot be deleted")]
    PresetProtected(String),

    /// The id does not name a panorama in the gallery.
    #[error("No panorama with id {0}")]
    UnknownPanorama(String),
}

impl ViewerError {
    pub fn decode(name: impl Into<String>, reason: impl ToString) -> Self {
        ViewerError::DecodeFailure {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;

impl From<pano_gpu::GpuError> for ViewerError {
    fn from(err: pano_gpu::GpuError) -> Self {
        match err {
            pano_gpu::GpuError::ContextLost
            | pano_gpu::GpuError::Surface(wgpu::SurfaceError::Lost) => {
                ViewerError::RenderContextLost
            }
            other => ViewerError::decode("texture", other),
        }
    }
}

/// Startup failures of the windowed runtime.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("Window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("GPU initialization failed: {0}")]
    Gpu(#[from] pano_gpu::GpuError),
}
