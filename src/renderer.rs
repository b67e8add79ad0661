//! Draws the viewer state through the sphere pipeline.

use pano_gpu::{CameraUniform, GpuContext, RenderConfig, SpherePipeline, Texture};

use crate::decode::DecodedImage;
use crate::error::{Result, ViewerError};
use crate::viewer::ViewerState;

/// How a frame attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Presented,
    /// Surface not ready (timeout or outdated); try again next frame.
    Skipped,
}

/// The panorama currently bound to the pipeline.
struct BoundPanorama {
    _texture: Texture,
    bind_group: wgpu::BindGroup,
}

/// GPU side of the viewer: context, pipeline and the bound panorama.
pub struct SceneRenderer {
    ctx: GpuContext,
    pipeline: SpherePipeline,
    panorama: Option<BoundPanorama>,
}

impl SceneRenderer {
    pub fn new(ctx: GpuContext) -> Self {
        let pipeline = SpherePipeline::new(&ctx, RenderConfig::default());
        log::info!(
            "Renderer ready: {}x{}, max texture {}",
            ctx.width(),
            ctx.height(),
            ctx.max_texture_dimension()
        );
        Self {
            ctx,
            pipeline,
            panorama: None,
        }
    }

    pub fn max_texture_dimension(&self) -> u32 {
        self.ctx.max_texture_dimension()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.ctx.width(), self.ctx.height())
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
    }

    /// Whether the device is gone and the renderer must be rebuilt.
    pub fn is_device_lost(&self) -> bool {
        self.ctx.is_lost()
    }

    /// Upload a decoded panorama and bind it, replacing the previous one.
    pub fn set_panorama(&mut self, image: &DecodedImage) -> Result<()> {
        let texture = Texture::from_rgba8(
            &self.ctx,
            &image.rgba,
            image.texture_width,
            image.texture_height,
        )?;
        let bind_group = self.pipeline.create_texture_bind_group(&self.ctx, &texture);
        self.panorama = Some(BoundPanorama {
            _texture: texture,
            bind_group,
        });
        Ok(())
    }

    pub fn clear_panorama(&mut self) {
        self.panorama = None;
    }

    /// Render one frame from `state`.
    ///
    /// A lost surface is reconfigured and reported as
    /// [`ViewerError::RenderContextLost`] so the caller reloads the panorama.
    pub fn render(&mut self, state: &ViewerState) -> Result<FrameStatus> {
        if self.ctx.is_lost() {
            return Err(ViewerError::RenderContextLost);
        }

        let frame = match self.ctx.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Outdated) => {
                self.ctx.reconfigure();
                return Ok(FrameStatus::Skipped);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("Surface timeout, skipping frame");
                return Ok(FrameStatus::Skipped);
            }
            Err(wgpu::SurfaceError::Lost) => {
                self.ctx.reconfigure();
                return Err(ViewerError::RenderContextLost);
            }
            Err(e) => return Err(pano_gpu::GpuError::from(e).into()),
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let camera = CameraUniform::from_parts(
            state.orientation.projection_matrix(state.aspect),
            state.orientation.view_matrix(),
            state.sphere_rotation,
        );
        self.pipeline.update_camera(&self.ctx, camera);

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Panorama Render Encoder"),
            });
        self.pipeline.render(
            &mut encoder,
            &view,
            self.panorama.as_ref().map(|p| &p.bind_group),
        );
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(FrameStatus::Presented)
    }
}
