//! Panorama sphere rendering pipeline.

use wgpu::util::DeviceExt;

use super::{BindGroupLayoutBuilder, PipelineBuilder};
use crate::bindings::{
    CAMERA_BINDING, CAMERA_GROUP, SAMPLER_BINDING, TEXTURE_BINDING, TEXTURE_GROUP,
};
use crate::config::RenderConfig;
use crate::context::GpuContext;
use crate::mesh::{SphereMesh, SphereVertex};
use crate::texture::Texture;
use crate::uniform::CameraUniform;

/// Draws a textured inward-facing sphere around the camera.
pub struct SpherePipeline {
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    render_config: RenderConfig,
}

impl SpherePipeline {
    pub fn new(ctx: &GpuContext, render_config: RenderConfig) -> Self {
        let shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Sphere Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/sphere.wgsl").into()),
            });

        let camera_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[CameraUniform::new()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let camera_bind_group_layout = BindGroupLayoutBuilder::new(&ctx.device)
            .with_label("Camera Bind Group Layout")
            .add_uniform_buffer(CAMERA_BINDING, wgpu::ShaderStages::VERTEX)
            .build();

        let texture_bind_group_layout = BindGroupLayoutBuilder::new(&ctx.device)
            .with_label("Panorama Bind Group Layout")
            .add_texture_2d(TEXTURE_BINDING, wgpu::ShaderStages::FRAGMENT)
            .add_sampler(SAMPLER_BINDING, wgpu::ShaderStages::FRAGMENT)
            .build();

        let camera_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: CAMERA_BINDING,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let render_pipeline = PipelineBuilder::new(&ctx.device, ctx.surface_config.format)
            .with_label("Sphere Render Pipeline")
            .with_shader(&shader, "vs_main", "fs_main")
            .with_vertex_buffer(SphereVertex::desc())
            .with_bind_group_layouts(&[&camera_bind_group_layout, &texture_bind_group_layout])
            .build();

        let mesh = SphereMesh::panorama();

        let vertex_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Sphere Vertex Buffer"),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Sphere Index Buffer"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        log::debug!(
            "Sphere pipeline ready: {} vertices, {} indices",
            mesh.vertices.len(),
            mesh.index_count()
        );

        Self {
            render_pipeline,
            vertex_buffer,
            index_buffer,
            num_indices: mesh.index_count(),
            camera_buffer,
            camera_bind_group,
            texture_bind_group_layout,
            render_config,
        }
    }

    /// Create bind group for a panorama texture.
    pub fn create_texture_bind_group(&self, ctx: &GpuContext, texture: &Texture) -> wgpu::BindGroup {
        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Panorama Bind Group"),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: TEXTURE_BINDING,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: SAMPLER_BINDING,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        })
    }

    pub fn update_camera(&self, ctx: &GpuContext, camera: CameraUniform) {
        ctx.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera]));
    }

    /// Clear the target and, when a panorama is bound, draw the sphere.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        texture_bind_group: Option<&wgpu::BindGroup>,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Sphere Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.render_config.clear_color.into()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let Some(texture_bind_group) = texture_bind_group else {
            return;
        };

        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_bind_group(CAMERA_GROUP, &self.camera_bind_group, &[]);
        render_pass.set_bind_group(TEXTURE_GROUP, texture_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.num_indices, 0, 0..1);
    }
}
