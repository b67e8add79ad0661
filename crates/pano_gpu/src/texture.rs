use crate::config::TextureConfig;
use crate::context::GpuContext;
use crate::error::{GpuError, Result};

/// GPU texture holding one equirectangular panorama.
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Create a texture from RGBA8 bytes with default configuration.
    pub fn from_rgba8(ctx: &GpuContext, data: &[u8], width: u32, height: u32) -> Result<Self> {
        Self::from_rgba8_with_config(ctx, data, width, height, TextureConfig::default())
    }

    /// Create a texture from RGBA8 bytes with custom configuration.
    pub fn from_rgba8_with_config(
        ctx: &GpuContext,
        data: &[u8],
        width: u32,
        height: u32,
        config: TextureConfig,
    ) -> Result<Self> {
        validate_rgba8(data, width, height, ctx.max_texture_dimension())?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Panorama Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        ctx.queue.write_texture(
            texture.as_image_copy(),
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Panorama Sampler"),
            address_mode_u: config.address_mode_u,
            address_mode_v: config.address_mode_v,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: config.mag_filter,
            min_filter: config.min_filter,
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            sampler,
            width,
            height,
        })
    }
}

/// Check that an RGBA8 buffer matches its dimensions and fits the device.
fn validate_rgba8(data: &[u8], width: u32, height: u32, max_dimension: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(GpuError::Texture(format!(
            "Empty texture: {}x{}",
            width, height
        )));
    }
    if width > max_dimension || height > max_dimension {
        return Err(GpuError::Texture(format!(
            "Texture {}x{} exceeds device limit of {}",
            width, height, max_dimension
        )));
    }
    let expected_size = width as usize * height as usize * 4;
    if data.len() != expected_size {
        return Err(GpuError::Texture(format!(
            "Invalid data size: expected {} bytes for {}x{} RGBA8, got {}",
            expected_size,
            width,
            height,
            data.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_matching_buffer() {
        let data = vec![0u8; 8 * 4 * 4];
        assert!(validate_rgba8(&data, 8, 4, 2048).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_length() {
        let data = vec![0u8; 10];
        let err = validate_rgba8(&data, 8, 4, 2048).unwrap_err();
        assert!(err.to_string().contains("expected 128 bytes"));
    }

    #[test]
    fn test_validate_rejects_oversized() {
        let data = vec![0u8; 4096 * 2 * 4];
        assert!(validate_rgba8(&data, 4096, 2, 2048).is_err());
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(validate_rgba8(&[], 0, 0, 2048).is_err());
    }
}
