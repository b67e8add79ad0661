//! Browser entry point and the JS control surface.

use std::cell::RefCell;
use std::sync::Arc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{DragEvent, Event, HtmlCanvasElement};
use winit::dpi::LogicalSize;
use winit::event_loop::EventLoop;
use winit::platform::web::{EventLoopExtWebSys, WindowBuilderExtWebSys, WindowExtWebSys};
use winit::window::WindowBuilder;

use crate::app::{App, post_command};
use crate::config::{AppConfig, LogLevel};
use crate::constants::window;
use crate::error::AppError;
use crate::panorama::PanoramaId;
use crate::render_loop::{CancellationToken, cancel, new_token};
use crate::renderer::SceneRenderer;
use crate::viewer::{Command, ViewerSnapshot};
use crate::wasm_file;

/// Id of a page-provided canvas; one is appended to `<body>` if absent.
const CANVAS_ID: &str = "panoview-canvas";

thread_local! {
    static SNAPSHOT: RefCell<String> = const { RefCell::new(String::new()) };
    static SHUTDOWN: RefCell<Option<CancellationToken>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    // Logging is up before the config loads so storage problems show in the
    // console; the configured level is applied afterwards.
    if console_log::init_with_level(log::Level::Trace).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::set_max_level(LogLevel::default().to_level_filter());
    let config = AppConfig::load_or_create();
    log::set_max_level(config.log_level.to_level_filter());
    log::info!("ℹ️  Winit uses exceptions for control flow; related console errors can be ignored.");

    wasm_bindgen_futures::spawn_local(async move {
        if let Err(e) = run(config).await {
            log::error!("Application error: {}", e);
        }
    });
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;

    let canvas = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(CANVAS_ID))
        .and_then(|e| e.dyn_into::<HtmlCanvasElement>().ok());
    let builder = WindowBuilder::new().with_title(window::TITLE);
    let builder = match canvas {
        Some(canvas) => builder.with_canvas(Some(canvas)),
        None => builder.with_append(true).with_inner_size(LogicalSize::new(
            window::DEFAULT_SIZE.0,
            window::DEFAULT_SIZE.1,
        )),
    };
    let window = Arc::new(builder.build(&event_loop)?);

    if let Some(canvas) = window.canvas() {
        if let Err(e) = install_canvas_listeners(&canvas) {
            log::error!("Failed to install canvas listeners: {:?}", e);
        }
    }

    let ctx = pano_gpu::GpuContext::new(window.clone()).await?;
    let renderer = SceneRenderer::new(ctx);

    let token = new_token();
    SHUTDOWN.with(|slot| *slot.borrow_mut() = Some(token.clone()));

    let mut app = App::new(window, renderer, config, token);
    log::info!("Viewer running");
    event_loop.spawn(move |event, elwt| app.handle_event(event, elwt));
    Ok(())
}

/// File drop and WebGL context loss/restore on the canvas.
fn install_canvas_listeners(canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
    let on_dragover = Closure::<dyn FnMut(DragEvent)>::new(|event: DragEvent| {
        event.prevent_default();
    });
    canvas.add_event_listener_with_callback("dragover", on_dragover.as_ref().unchecked_ref())?;
    on_dragover.forget();

    let on_drop = Closure::<dyn FnMut(DragEvent)>::new(|event: DragEvent| {
        event.prevent_default();
        let files = event.data_transfer().and_then(|dt| dt.files());
        match files {
            Some(files) if files.length() > 0 => {
                log::info!("{} file(s) dropped", files.length());
                post_command(Command::FilesOffered(wasm_file::file_infos(&files)));
            }
            _ => log::debug!("Drop without files"),
        }
    });
    canvas.add_event_listener_with_callback("drop", on_drop.as_ref().unchecked_ref())?;
    on_drop.forget();

    let on_lost = Closure::<dyn FnMut(Event)>::new(|event: Event| {
        // Allows the browser to restore the context later.
        event.prevent_default();
        post_command(Command::ContextLost);
    });
    canvas.add_event_listener_with_callback("webglcontextlost", on_lost.as_ref().unchecked_ref())?;
    on_lost.forget();

    let on_restored = Closure::<dyn FnMut(Event)>::new(|_event: Event| {
        post_command(Command::ContextRestored);
    });
    canvas.add_event_listener_with_callback(
        "webglcontextrestored",
        on_restored.as_ref().unchecked_ref(),
    )?;
    on_restored.forget();

    Ok(())
}

/// Store the latest state for [`snapshot_json`].
pub(crate) fn publish_snapshot(snapshot: &ViewerSnapshot) {
    match serde_json::to_string(snapshot) {
        Ok(json) => SNAPSHOT.with(|slot| *slot.borrow_mut() = json),
        Err(e) => log::warn!("Failed to serialize snapshot: {}", e),
    }
}

#[wasm_bindgen]
pub fn open_file_picker() {
    // Called straight from the page's click handler so the picker keeps the
    // user activation.
    if let Err(e) = wasm_file::open_file_picker() {
        log::error!("Failed to open file picker: {:?}", e);
    }
}

#[wasm_bindgen]
pub fn toggle_auto_rotate() {
    post_command(Command::ToggleAutoRotate);
}

#[wasm_bindgen]
pub fn reset_camera() {
    post_command(Command::ResetCamera);
}

#[wasm_bindgen]
pub fn select_panorama(id: String) {
    post_command(Command::Select(PanoramaId::new(id)));
}

#[wasm_bindgen]
pub fn delete_panorama(id: String) {
    post_command(Command::Delete(PanoramaId::new(id)));
}

#[wasm_bindgen]
pub fn dismiss_notification(id: u32) {
    post_command(Command::DismissNotification(u64::from(id)));
}

/// Gallery, notifications and camera state as JSON, refreshed every frame.
#[wasm_bindgen]
pub fn snapshot_json() -> String {
    SNAPSHOT.with(|slot| slot.borrow().clone())
}

/// Stop the render loop; the event loop exits on the next frame.
#[wasm_bindgen]
pub fn shutdown() {
    SHUTDOWN.with(|slot| match slot.borrow().as_ref() {
        Some(token) => cancel(token),
        None => log::warn!("shutdown() called before the viewer started"),
    });
}
