//! Panoview - 360° equirectangular panorama viewer
//!
//! A GPU-accelerated viewer for the desktop and the web: drag, wheel,
//! pinch and keyboard navigation inside a textured sphere, a gallery of
//! bundled and uploaded panoramas, and transient notifications.

pub mod app;
pub mod config;
pub mod constants;
pub mod decode;
pub mod error;
pub mod gallery;
pub mod hint;
pub mod ingest;
pub mod input;
pub mod keybindings;
pub mod messages;
pub mod notification;
pub mod orientation;
pub mod panorama;
pub mod render_loop;
pub mod renderer;
pub mod viewer;

#[cfg(not(target_arch = "wasm32"))]
pub mod native;

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;
#[cfg(target_arch = "wasm32")]
pub mod wasm_file;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;

pub use config::AppConfig;
pub use error::{AppError, ViewerError};
pub use viewer::{Command, Effect, Viewer, ViewerSnapshot};
