//! Upload screening: MIME allow-list, size ceiling and aspect-ratio check.

use std::sync::Arc;

use crate::config::UploadLimits;
use crate::error::{Result, ViewerError};

/// Where an offered file's bytes live until they are read.
#[derive(Clone)]
pub enum FileHandle {
    /// Bytes already in memory.
    Bytes(Arc<[u8]>),
    /// A file on disk (dialog or window drop).
    #[cfg(not(target_arch = "wasm32"))]
    Path(std::path::PathBuf),
    /// A browser `File` from the picker or a drop.
    #[cfg(target_arch = "wasm32")]
    Web(web_sys::File),
}

impl std::fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileHandle::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            #[cfg(not(target_arch = "wasm32"))]
            FileHandle::Path(path) => f.debug_tuple("Path").field(path).finish(),
            #[cfg(target_arch = "wasm32")]
            FileHandle::Web(file) => write!(f, "Web({})", file.name()),
        }
    }
}

/// A file offered for upload, before its contents are read.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub name: String,
    /// Declared MIME type; derived from the extension when the platform gives none.
    pub mime: String,
    pub size: u64,
    pub handle: FileHandle,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, declared_mime: &str, size: u64, handle: FileHandle) -> Self {
        let name = name.into();
        let mime = if declared_mime.trim().is_empty() {
            mime_from_extension(&name).unwrap_or_default().to_string()
        } else {
            declared_mime.trim().to_ascii_lowercase()
        };
        Self {
            name,
            mime,
            size,
            handle,
        }
    }

    /// In-memory file; the MIME type comes from the extension if not given.
    pub fn from_bytes(name: impl Into<String>, declared_mime: &str, bytes: Vec<u8>) -> Self {
        let size = bytes.len() as u64;
        Self::new(name, declared_mime, size, FileHandle::Bytes(Arc::from(bytes)))
    }

    /// File on disk. Size comes from metadata; an unreadable file reports 0
    /// and fails later when its bytes are read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_path(path: std::path::PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let size = match std::fs::metadata(&path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                log::warn!("Cannot stat {:?}: {}", path, e);
                0
            }
        };
        Self::new(name, "", size, FileHandle::Path(path))
    }
}

/// MIME type for a supported image extension.
pub fn mime_from_extension(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Check one file against the allow-list and the size ceiling.
pub fn validate(file: &FileInfo, limits: &UploadLimits) -> Result<()> {
    if !limits.supported_formats.iter().any(|m| m == &file.mime) {
        return Err(ViewerError::UnsupportedFormat {
            name: file.name.clone(),
            mime: file.mime.clone(),
        });
    }
    if file.size > limits.max_file_size {
        return Err(ViewerError::FileTooLarge {
            name: file.name.clone(),
            size: file.size,
            limit: limits.max_file_size,
        });
    }
    Ok(())
}

/// Result of screening a batch of offered files.
#[derive(Debug, Default)]
pub struct Screening {
    pub accepted: Vec<FileInfo>,
    pub rejected: Vec<ViewerError>,
}

impl Screening {
    /// Rejections caused by the size ceiling; each gets its own notification.
    pub fn oversized(&self) -> impl Iterator<Item = &ViewerError> {
        self.rejected
            .iter()
            .filter(|e| matches!(e, ViewerError::FileTooLarge { .. }))
    }
}

/// Split offered files into accepted and rejected, preserving order.
pub fn screen(files: Vec<FileInfo>, limits: &UploadLimits) -> Screening {
    let mut screening = Screening::default();
    for file in files {
        match validate(&file, limits) {
            Ok(()) => screening.accepted.push(file),
            Err(e) => {
                log::debug!("Rejected upload: {}", e);
                screening.rejected.push(e);
            }
        }
    }
    screening
}

/// Whether `width:height` is within tolerance of the target ratio.
pub fn aspect_ratio_ok(width: u32, height: u32, limits: &UploadLimits) -> bool {
    if height == 0 {
        return false;
    }
    let ratio = width as f32 / height as f32;
    (ratio - limits.target_aspect_ratio).abs() <= limits.aspect_ratio_tolerance
}
