//! Native desktop bootstrap.

use std::sync::Arc;

use pano_gpu::GpuContext;
use winit::dpi::LogicalSize;
use winit::event_loop::EventLoop;
use winit::window::WindowBuilder;

use crate::app::App;
use crate::config::AppConfig;
use crate::constants::window;
use crate::error::AppError;
use crate::render_loop::new_token;
use crate::renderer::SceneRenderer;

/// Open the viewer window and run until it is closed.
pub fn run(config: AppConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;

    let window = WindowBuilder::new()
        .with_title(window::TITLE)
        .with_inner_size(LogicalSize::new(
            window::DEFAULT_SIZE.0,
            window::DEFAULT_SIZE.1,
        ))
        .with_min_inner_size(LogicalSize::new(window::MIN_SIZE.0, window::MIN_SIZE.1))
        .build(&event_loop)?;
    let window = Arc::new(window);

    let ctx = pollster::block_on(GpuContext::new(window.clone()))?;
    let renderer = SceneRenderer::new(ctx);

    let mut app = App::new(window, renderer, config, new_token());
    log::info!("Viewer running");
    event_loop.run(move |event, elwt| app.handle_event(event, elwt))?;
    Ok(())
}
