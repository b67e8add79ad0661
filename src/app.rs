//! The windowed runtime shared by the native and browser builds.
//!
//! [`App`] owns the window, the renderer and the [`Viewer`]; the platform
//! bootstrap creates it and forwards every winit event to
//! [`App::handle_event`]. Commands raised outside the event loop (browser
//! callbacks, JS exports) are posted to a thread-local queue and drained at
//! the start of each frame.

use std::cell::RefCell;
use std::sync::Arc;

use web_time::Instant;
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopWindowTarget};
use winit::keyboard::PhysicalKey;
use winit::window::Window;

use crate::config::AppConfig;
use crate::constants::PIXELS_PER_MAGNIFY;
use crate::decode;
use crate::error::ViewerError;
use crate::input::{Gesture, PointerTracker, wheel_delta_y};
use crate::keybindings::{Key, KeyAction};
use crate::render_loop::{CancellationToken, RenderLoop, cancel};
use crate::renderer::SceneRenderer;
use crate::viewer::{Command, Effect, Viewer};

thread_local! {
    static POSTED: RefCell<Vec<Command>> = const { RefCell::new(Vec::new()) };
}

/// Queue a command for the next frame.
pub fn post_command(command: Command) {
    POSTED.with(|posted| posted.borrow_mut().push(command));
}

fn take_posted() -> Vec<Command> {
    POSTED.with(|posted| std::mem::take(&mut *posted.borrow_mut()))
}

pub struct App {
    window: Arc<Window>,
    /// `None` while the GPU context is being rebuilt.
    renderer: Option<SceneRenderer>,
    viewer: Viewer,
    pointer: PointerTracker,
    render_loop: RenderLoop,
    scale_factor: f64,
    title: String,
}

impl App {
    pub fn new(
        window: Arc<Window>,
        renderer: SceneRenderer,
        config: AppConfig,
        token: CancellationToken,
    ) -> Self {
        let now = Instant::now();
        let mut viewer = Viewer::new(
            config,
            decode::default_backend(),
            renderer.max_texture_dimension(),
            now,
        );
        let (width, height) = renderer.size();
        viewer.handle(Command::Resized { width, height }, now);
        viewer.start(now);

        Self {
            scale_factor: window.scale_factor(),
            window,
            renderer: Some(renderer),
            viewer,
            pointer: PointerTracker::new(),
            render_loop: RenderLoop::new(token),
            title: String::new(),
        }
    }

    pub fn handle_event(&mut self, event: Event<()>, elwt: &EventLoopWindowTarget<()>) {
        elwt.set_control_flow(ControlFlow::Wait);

        match event {
            Event::WindowEvent { event, window_id } if window_id == self.window.id() => {
                self.handle_window_event(event, elwt)
            }
            Event::AboutToWait => self.window.request_redraw(),
            _ => {}
        }
    }

    fn handle_window_event(&mut self, event: WindowEvent, elwt: &EventLoopWindowTarget<()>) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Window closed");
                cancel(&self.render_loop.token());
                elwt.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size.width, size.height);
                }
                self.dispatch(Command::Resized {
                    width: size.width,
                    height: size.height,
                });
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
            }
            WindowEvent::RedrawRequested => self.redraw(elwt),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let gesture = match state {
                    ElementState::Pressed => self.pointer.mouse_pressed(),
                    ElementState::Released => self.pointer.mouse_released(),
                };
                self.gesture(gesture);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = position.to_logical::<f32>(self.scale_factor);
                let gesture = self.pointer.cursor_moved(position.x, position.y);
                self.gesture(gesture);
            }
            WindowEvent::CursorLeft { .. } => self.pointer.cursor_left(),
            WindowEvent::MouseWheel { delta, .. } => {
                let delta_y = wheel_delta_y(delta, self.scale_factor);
                self.gesture(Some(Gesture::Wheel { delta_y }));
            }
            WindowEvent::Touch(touch) => {
                let location = touch.location.to_logical::<f32>(self.scale_factor);
                let gesture = self
                    .pointer
                    .touch(touch.id, touch.phase, location.x, location.y);
                self.gesture(gesture);
            }
            WindowEvent::TouchpadMagnify { delta, .. } => {
                let change = delta as f32 * PIXELS_PER_MAGNIFY;
                self.gesture(Some(Gesture::Pinch { change }));
            }
            WindowEvent::KeyboardInput { event, .. } => self.key(event),
            #[cfg(not(target_arch = "wasm32"))]
            WindowEvent::DroppedFile(path) => {
                log::info!("File dropped: {:?}", path);
                self.dispatch(Command::FilesOffered(vec![
                    crate::ingest::FileInfo::from_path(path),
                ]));
            }
            _ => {}
        }
    }

    fn gesture(&mut self, gesture: Option<Gesture>) {
        if let Some(gesture) = gesture {
            self.dispatch(Command::Gesture(gesture));
        }
    }

    fn key(&mut self, event: KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let Some(action) = Key::from_key_code(code)
            .and_then(|key| self.viewer.config().keybindings.action_for(key))
        else {
            return;
        };
        let repeatable = matches!(
            action,
            KeyAction::RotateLeft
                | KeyAction::RotateRight
                | KeyAction::RotateUp
                | KeyAction::RotateDown
        );
        if event.repeat && !repeatable {
            return;
        }
        self.dispatch(Command::Key(action));
    }

    /// Run one command through the viewer and carry out its effects.
    pub fn dispatch(&mut self, command: Command) {
        let now = Instant::now();
        if matches!(command, Command::ContextRestored)
            && self.renderer.as_ref().is_some_and(|r| r.is_device_lost())
        {
            self.rebuild_renderer();
            return;
        }
        let effects = self.viewer.handle(command, now);
        self.apply(effects, now);
    }

    fn apply(&mut self, effects: Vec<Effect>, now: Instant) {
        for effect in effects {
            match effect {
                Effect::ShowTexture(image) => {
                    let Some(renderer) = self.renderer.as_mut() else {
                        log::debug!("No renderer, texture deferred to context restore");
                        continue;
                    };
                    if let Err(e) = renderer.set_panorama(&image) {
                        self.viewer.report(&e, now);
                    }
                }
                Effect::ClearScene => {
                    if let Some(renderer) = self.renderer.as_mut() {
                        renderer.clear_panorama();
                    }
                }
                Effect::OpenFilePicker => self.open_file_picker(),
            }
        }
    }

    fn redraw(&mut self, elwt: &EventLoopWindowTarget<()>) {
        for command in take_posted() {
            self.dispatch(command);
        }
        self.poll_rebuilt_renderer();

        let now = Instant::now();
        let mut effects = Vec::new();
        let viewer = &mut self.viewer;
        let running = self
            .render_loop
            .tick(now, |now| effects.extend(viewer.frame(now)));
        if !running {
            log::info!("Render loop cancelled after {} frames", self.render_loop.frames());
            elwt.exit();
            return;
        }
        self.apply(effects, now);

        let viewer = &self.viewer;
        let rendered = self.renderer.as_mut().map(|r| r.render(viewer.state()));
        match rendered {
            Some(Err(ViewerError::RenderContextLost)) => self.context_lost(),
            Some(Err(e)) => log::error!("Render failed: {}", e),
            Some(Ok(_)) | None => {}
        }

        self.publish(now);
    }

    fn context_lost(&mut self) {
        self.dispatch(Command::ContextLost);
        let device_lost = self.renderer.as_ref().is_some_and(|r| r.is_device_lost());
        if device_lost {
            self.rebuild_renderer();
        } else {
            // The surface was reconfigured in place.
            self.dispatch(Command::ContextRestored);
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn rebuild_renderer(&mut self) {
        log::warn!("GPU device lost, recreating context");
        self.renderer = None;
        match pollster::block_on(pano_gpu::GpuContext::new(self.window.clone())) {
            Ok(ctx) => self.renderer_ready(SceneRenderer::new(ctx)),
            Err(e) => log::error!("Failed to recreate GPU context: {}", e),
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn rebuild_renderer(&mut self) {
        log::warn!("GPU device lost, recreating context");
        self.renderer = None;
        let window = self.window.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match pano_gpu::GpuContext::new(window).await {
                Ok(ctx) => {
                    let renderer = SceneRenderer::new(ctx);
                    REBUILT.with(|slot| *slot.borrow_mut() = Some(renderer));
                }
                Err(e) => log::error!("Failed to recreate GPU context: {}", e),
            }
        });
    }

    #[cfg(target_arch = "wasm32")]
    fn poll_rebuilt_renderer(&mut self) {
        if let Some(renderer) = REBUILT.with(|slot| slot.borrow_mut().take()) {
            self.renderer_ready(renderer);
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn poll_rebuilt_renderer(&mut self) {}

    fn renderer_ready(&mut self, mut renderer: SceneRenderer) {
        let size = self.window.inner_size();
        renderer.resize(size.width, size.height);
        self.viewer
            .set_max_texture_dimension(renderer.max_texture_dimension());
        self.renderer = Some(renderer);
        log::info!("GPU context ready again");
        let effects = self.viewer.handle(Command::ContextRestored, Instant::now());
        self.apply(effects, Instant::now());
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn open_file_picker(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Выберите панорамы")
            .add_filter("Панорамы", &["jpg", "jpeg", "png", "webp"])
            .pick_files();
        match picked {
            Some(paths) if !paths.is_empty() => {
                let files = paths
                    .into_iter()
                    .map(crate::ingest::FileInfo::from_path)
                    .collect();
                self.dispatch(Command::FilesOffered(files));
            }
            _ => log::debug!("File dialog cancelled"),
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn open_file_picker(&mut self) {
        if let Err(e) = crate::wasm_file::open_file_picker() {
            log::error!("Failed to open file picker: {:?}", e);
        }
    }

    /// Reflect viewer state outside the canvas: window title natively,
    /// the JSON snapshot for the page on the web.
    fn publish(&mut self, now: Instant) {
        #[cfg(target_arch = "wasm32")]
        crate::wasm::publish_snapshot(&self.viewer.snapshot(now));

        let title = self.viewer.window_title(now);
        if title != self.title {
            self.window.set_title(&title);
            self.title = title;
        }
    }
}

#[cfg(target_arch = "wasm32")]
thread_local! {
    static REBUILT: RefCell<Option<SceneRenderer>> = const { RefCell::new(None) };
}
