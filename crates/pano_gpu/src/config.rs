//! Configuration structs for GPU settings.
//!
//! Defaults are tuned for a single full-window panorama: vsync on, a texture
//! sampler that wraps horizontally across the equirectangular seam, and a
//! black background behind a sphere that has not loaded yet.

/// Configuration for GPU context initialization.
#[derive(Debug, Clone)]
pub struct GpuConfig {
    /// Power preference for adapter selection.
    pub power_preference: wgpu::PowerPreference,
    /// Present mode (VSync behavior).
    pub present_mode: wgpu::PresentMode,
    /// Maximum frames in flight.
    pub max_frame_latency: u32,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::default(),
            present_mode: wgpu::PresentMode::Fifo,
            max_frame_latency: 2,
        }
    }
}

/// Configuration for texture creation and sampling.
#[derive(Debug, Clone)]
pub struct TextureConfig {
    pub mag_filter: wgpu::FilterMode,
    pub min_filter: wgpu::FilterMode,
    /// Horizontal addressing. Panoramas wrap around, so this repeats.
    pub address_mode_u: wgpu::AddressMode,
    /// Vertical addressing. Poles clamp.
    pub address_mode_v: wgpu::AddressMode,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
        }
    }
}

/// Configuration for render passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    /// Clear color behind the sphere.
    pub clear_color: ClearColor,
}

/// Clear color for render passes.
#[derive(Debug, Clone, Copy)]
pub struct ClearColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl ClearColor {
    pub const BLACK: ClearColor = ClearColor {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<ClearColor> for wgpu::Color {
    fn from(c: ClearColor) -> Self {
        wgpu::Color {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panorama_sampler_wraps_horizontally() {
        let config = TextureConfig::default();
        assert_eq!(config.address_mode_u, wgpu::AddressMode::Repeat);
        assert_eq!(config.address_mode_v, wgpu::AddressMode::ClampToEdge);
    }

    #[test]
    fn test_clear_color_conversion() {
        let color: wgpu::Color = RenderConfig::default().clear_color.into();
        assert_eq!(color, wgpu::Color::BLACK);
    }

    #[test]
    fn test_default_keeps_vsync() {
        let config = GpuConfig::default();
        assert_eq!(config.present_mode, wgpu::PresentMode::Fifo);
        assert_eq!(config.max_frame_latency, 2);
    }
}
