//! Configuration file support.
//!
//! Settings live in a versioned JSON document: a file under the user's config
//! directory natively, a `localStorage` entry on the web. Every section falls
//! back to defaults for missing fields so older files keep loading.

use serde::{Deserialize, Serialize};

use crate::constants::{
    ASPECT_RATIO_TOLERANCE, DEFAULT_AUTO_ROTATE_SPEED, DEFAULT_FOV_DEG, DEFAULT_PRESET_DIR,
    DRAG_SENSITIVITY, KEY_STEP, MAX_FILE_SIZE, NOTIFICATION_TIMEOUT_MS, PINCH_SENSITIVITY,
    SUPPORTED_MIME_TYPES, TARGET_ASPECT_RATIO, WHEEL_SENSITIVITY,
};
use crate::keybindings::KeyBindings;
use crate::orientation::clamp_fov;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }

    /// Max level to install once this level is known; `None` when a
    /// non-empty `RUST_LOG` already picked the filter.
    pub fn override_filter(&self, rust_log: Option<&str>) -> Option<log::LevelFilter> {
        match rust_log {
            Some(filter) if !filter.trim().is_empty() => None,
            _ => Some(self.to_level_filter()),
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Interaction tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerTuning {
    /// Radians of rotation per pixel of drag.
    pub drag_sensitivity: f32,
    /// Radians per arrow-key press.
    pub key_step: f32,
    /// Degrees of field-of-view per wheel `deltaY` unit.
    pub wheel_sensitivity: f32,
    /// Degrees of field-of-view per pixel of pinch distance change.
    pub pinch_sensitivity: f32,
    /// Auto-rotate speed; each frame advances `speed * 0.01` radians.
    pub auto_rotate_speed: f32,
    pub auto_rotate_on_start: bool,
    /// Field-of-view restored on reset and on every load.
    pub default_fov_deg: f32,
    pub notification_timeout_ms: u64,
}

impl Default for ViewerTuning {
    fn default() -> Self {
        Self {
            drag_sensitivity: DRAG_SENSITIVITY,
            key_step: KEY_STEP,
            wheel_sensitivity: WHEEL_SENSITIVITY,
            pinch_sensitivity: PINCH_SENSITIVITY,
            auto_rotate_speed: DEFAULT_AUTO_ROTATE_SPEED,
            auto_rotate_on_start: false,
            default_fov_deg: DEFAULT_FOV_DEG,
            notification_timeout_ms: NOTIFICATION_TIMEOUT_MS,
        }
    }
}

impl ViewerTuning {
    /// Default field-of-view kept inside the allowed range.
    pub fn reset_fov(&self) -> f32 {
        clamp_fov(self.default_fov_deg)
    }
}

/// Upload acceptance rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadLimits {
    /// Allowed declared MIME types.
    pub supported_formats: Vec<String>,
    /// Byte-size ceiling, inclusive.
    pub max_file_size: u64,
    pub target_aspect_ratio: f32,
    pub aspect_ratio_tolerance: f32,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            supported_formats: SUPPORTED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
            max_file_size: MAX_FILE_SIZE,
            target_aspect_ratio: TARGET_ASPECT_RATIO,
            aspect_ratio_tolerance: ASPECT_RATIO_TOLERANCE,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    #[serde(default)]
    pub log_level: LogLevel,

    /// Directory (native) or URL prefix (web) of the preset panoramas.
    #[serde(default = "default_preset_dir")]
    pub preset_dir: String,

    #[serde(default)]
    pub viewer: ViewerTuning,

    #[serde(default)]
    pub upload: UploadLimits,

    #[serde(default)]
    pub keybindings: KeyBindings,
}

fn default_preset_dir() -> String {
    DEFAULT_PRESET_DIR.to_string()
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            log_level: LogLevel::default(),
            preset_dir: default_preset_dir(),
            viewer: ViewerTuning::default(),
            upload: UploadLimits::default(),
            keybindings: KeyBindings::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        for (key, first, second) in config.keybindings.conflicts() {
            log::warn!(
                "Key {:?} is bound to both '{}' and '{}'; using '{}'",
                key,
                first.name(),
                second.name(),
                first.name()
            );
        }

        Ok(config)
    }

    pub fn default_filename() -> &'static str {
        "panoview-config.json"
    }

    /// Default config file path. `None` when no config or home directory is known.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("panoview").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home| {
                home.join(".config")
                    .join("panoview")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load from `path`; `Ok(None)` when the file does not exist.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path(path: &std::path::Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Ok(None);
        }
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(Some(config))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load the config at the default path, writing defaults there on first run.
    ///
    /// A broken file is reported and replaced by defaults in memory only.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_or_create() -> Self {
        let Some(path) = Self::default_path() else {
            log::warn!("Could not determine config directory, using defaults");
            return Self::new();
        };

        match Self::load_from_path(&path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                let config = Self::new();
                if let Err(e) = config.save_to_path(&path) {
                    log::warn!("Failed to write default config to {:?}: {}", path, e);
                }
                config
            }
            Err(e) => {
                log::warn!("Failed to load config {:?}: {}", path, e);
                Self::new()
            }
        }
    }

    /// LocalStorage key for WASM config persistence.
    #[cfg(target_arch = "wasm32")]
    const LOCALSTORAGE_KEY: &'static str = "panoview-config";

    #[cfg(target_arch = "wasm32")]
    fn local_storage() -> Result<web_sys::Storage, ConfigError> {
        let window = web_sys::window()
            .ok_or_else(|| ConfigError::StorageError("No window object available".to_string()))?;
        window
            .local_storage()
            .map_err(|e| ConfigError::StorageError(format!("localStorage access error: {:?}", e)))?
            .ok_or_else(|| ConfigError::StorageError("localStorage not available".to_string()))
    }

    /// Load configuration from localStorage; `Ok(None)` when nothing is stored.
    #[cfg(target_arch = "wasm32")]
    pub fn load_from_local_storage() -> Result<Option<Self>, ConfigError> {
        let storage = Self::local_storage()?;
        let json = storage
            .get_item(Self::LOCALSTORAGE_KEY)
            .map_err(|e| ConfigError::StorageError(format!("Failed to read: {:?}", e)))?;
        match json {
            Some(json) => {
                let config = Self::from_json(&json)?;
                log::info!("Loaded configuration from localStorage");
                Ok(Some(config))
            }
            None => Ok(None),
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn save_to_local_storage(&self) -> Result<(), ConfigError> {
        let storage = Self::local_storage()?;
        let json = self.to_json()?;
        storage
            .set_item(Self::LOCALSTORAGE_KEY, &json)
            .map_err(|e| ConfigError::StorageError(format!("Failed to save: {:?}", e)))?;
        log::info!("Saved configuration to localStorage");
        Ok(())
    }

    /// Web counterpart of the native loader.
    #[cfg(target_arch = "wasm32")]
    pub fn load_or_create() -> Self {
        match Self::load_from_local_storage() {
            Ok(Some(config)) => config,
            Ok(None) => {
                let config = Self::new();
                if let Err(e) = config.save_to_local_storage() {
                    log::warn!("Failed to store default config: {}", e);
                }
                config
            }
            Err(e) => {
                log::warn!("Failed to load config from localStorage: {}", e);
                Self::new()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// localStorage failure on the web.
    #[error("Storage error: {0}")]
    StorageError(String),
}
