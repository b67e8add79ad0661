//! Panorama records and the preset catalog.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// Stable identifier of a gallery entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PanoramaId(String);

impl PanoramaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PanoramaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a panorama came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Bundled with the viewer; cannot be deleted.
    Preset,
    /// Uploaded by the user during this session.
    User,
}

impl Origin {
    /// Label shown on the gallery card.
    pub fn label(&self) -> &'static str {
        match self {
            Origin::Preset => "Демо",
            Origin::User => "Загружено",
        }
    }
}

/// Image data behind a panorama.
#[derive(Clone)]
pub enum ImageSource {
    /// Relative path (native) or URL (web), fetched on every load.
    Path(String),
    /// Bytes of an uploaded file, kept so the panorama can be shown again.
    Embedded(Arc<[u8]>),
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ImageSource::Embedded(bytes) => write!(f, "Embedded({} bytes)", bytes.len()),
        }
    }
}

/// One gallery entry.
#[derive(Debug, Clone)]
pub struct PanoramaRecord {
    pub id: PanoramaId,
    pub name: String,
    pub source: ImageSource,
    pub origin: Origin,
    /// File size in bytes, known for uploads.
    pub size: Option<u64>,
    /// Pixel dimensions formatted as `"W × H"`, known after decoding an upload.
    pub dimensions: Option<String>,
}

impl PanoramaRecord {
    pub fn preset(id: &str, name: &str, path: String) -> Self {
        Self {
            id: PanoramaId::new(id),
            name: name.to_string(),
            source: ImageSource::Path(path),
            origin: Origin::Preset,
            size: None,
            dimensions: None,
        }
    }

    pub fn is_deletable(&self) -> bool {
        self.origin == Origin::User
    }

    /// Dimensions text for the gallery card.
    pub fn dimensions_label(&self) -> &str {
        self.dimensions.as_deref().unwrap_or("N/A")
    }
}

pub fn format_dimensions(width: u32, height: u32) -> String {
    format!("{} × {}", width, height)
}

/// The bundled presets: `(id, display name, file name)`.
const PRESET_CATALOG: &[(&str, &str, &str)] = &[
    ("p1", "Панорама 1", "p1.jpg"),
    ("p2", "Панорама 2", "p2.jpg"),
    ("p3", "Панорама 3", "p3.jpg"),
    ("p4", "Панорама 4", "p4.jpg"),
    ("p5", "Панорама 5", "p5.jpg"),
    ("p6", "Панорама 6", "p6.jpeg"),
];

/// Build preset records with paths resolved against `preset_dir`.
pub fn preset_panoramas(preset_dir: &str) -> Vec<PanoramaRecord> {
    let dir = preset_dir.trim_end_matches('/');
    PRESET_CATALOG
        .iter()
        .map(|(id, name, file)| {
            let path = if dir.is_empty() {
                (*file).to_string()
            } else {
                format!("{}/{}", dir, file)
            };
            PanoramaRecord::preset(id, name, path)
        })
        .collect()
}

/// Generates unique ids for uploaded panoramas.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id, unique within this generator. Upload ids never collide with
    /// preset ids because of the `user-` prefix.
    pub fn next_id(&mut self) -> PanoramaId {
        self.next += 1;
        PanoramaId(format!("user-{}", self.next))
    }
}
