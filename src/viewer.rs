//! The viewer controller.
//!
//! [`Viewer`] owns all application state and is driven by two entry points:
//! [`Viewer::handle`] for discrete commands (input, gallery actions, uploads,
//! surface events) and [`Viewer::frame`] once per display refresh. Both return
//! [`Effect`]s for the platform runtime to carry out; nothing here touches the
//! GPU or the window directly.

use serde::Serialize;
use web_time::{Duration, Instant};

use crate::config::AppConfig;
use crate::constants::{AUTO_ROTATE_STEP, window};
use crate::decode::{
    DecodeBackend, DecodeInput, DecodeJob, DecodeOutcome, DecodePurpose, DecodedImage, LoadTicket,
    LoadTracker, Verdict,
};
use crate::error::ViewerError;
use crate::gallery::{Gallery, GalleryEntry};
use crate::hint::InteractionHint;
use crate::ingest::{self, FileInfo};
use crate::input::{DragState, Gesture};
use crate::keybindings::KeyAction;
use crate::messages;
use crate::notification::{NotificationCenter, NotificationKind, NotificationView};
use crate::orientation::{Orientation, StepDirection};
use crate::panorama::{
    IdGenerator, ImageSource, Origin, PanoramaId, PanoramaRecord, format_dimensions,
    preset_panoramas,
};

/// Load phase, drives the loading indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Loading,
}

/// Camera and display state.
#[derive(Debug, Clone)]
pub struct ViewerState {
    pub orientation: Orientation,
    pub auto_rotate: bool,
    pub drag: DragState,
    /// Rotation of the sphere about the vertical axis, advanced by auto-rotate.
    pub sphere_rotation: f32,
    pub phase: Phase,
    /// Panorama whose texture is on screen.
    pub displayed: Option<PanoramaId>,
    /// Viewport width over height.
    pub aspect: f32,
    pub context_lost: bool,
}

impl ViewerState {
    fn new(auto_rotate: bool, fov_deg: f32) -> Self {
        Self {
            orientation: Orientation::reset_with_fov(fov_deg),
            auto_rotate,
            drag: DragState::default(),
            sphere_rotation: 0.0,
            phase: Phase::Idle,
            displayed: None,
            aspect: window::DEFAULT_SIZE.0 as f32 / window::DEFAULT_SIZE.1 as f32,
            context_lost: false,
        }
    }
}

/// Discrete inputs to the controller.
#[derive(Debug, Clone)]
pub enum Command {
    Gesture(Gesture),
    Key(KeyAction),
    ToggleAutoRotate,
    ResetCamera,
    OpenFilePicker,
    Select(PanoramaId),
    SelectNext,
    SelectPrevious,
    Delete(PanoramaId),
    DeleteActive,
    /// Files chosen in the picker or dropped on the viewer.
    FilesOffered(Vec<FileInfo>),
    DismissNotification(u64),
    Resized { width: u32, height: u32 },
    ContextLost,
    ContextRestored,
}

/// Work for the platform runtime.
#[derive(Debug)]
pub enum Effect {
    /// Replace the sphere texture.
    ShowTexture(DecodedImage),
    /// Nothing is left to display.
    ClearScene,
    OpenFilePicker,
}

/// Serializable view of everything the page renders.
#[derive(Debug, Clone, Serialize)]
pub struct ViewerSnapshot {
    pub yaw: f32,
    pub pitch: f32,
    pub fov_deg: f32,
    pub sphere_rotation: f32,
    pub auto_rotate: bool,
    pub dragging: bool,
    pub phase: Phase,
    pub displayed: Option<String>,
    pub counter: String,
    pub gallery: Vec<GalleryEntry>,
    pub notifications: Vec<NotificationView>,
    /// Interaction hint text while it is visible.
    pub hint: Option<&'static str>,
    /// Upload prompt while the gallery is empty.
    pub prompt: Option<&'static str>,
}

/// A decoded panorama waiting for newer requests to finish.
struct Held {
    ticket: LoadTicket,
    id: PanoramaId,
    image: DecodedImage,
}

pub struct Viewer {
    state: ViewerState,
    gallery: Gallery,
    notifications: NotificationCenter,
    hint: InteractionHint,
    loads: LoadTracker,
    held: Option<Held>,
    /// Entries that failed to display since the last successful one.
    failed: Vec<PanoramaId>,
    ids: IdGenerator,
    config: AppConfig,
    decoder: Box<dyn DecodeBackend>,
    max_texture_dimension: u32,
}

impl Viewer {
    pub fn new(
        config: AppConfig,
        decoder: Box<dyn DecodeBackend>,
        max_texture_dimension: u32,
        now: Instant,
    ) -> Self {
        let state = ViewerState::new(
            config.viewer.auto_rotate_on_start,
            config.viewer.reset_fov(),
        );
        let notifications = NotificationCenter::new(Duration::from_millis(
            config.viewer.notification_timeout_ms,
        ));
        Self {
            state,
            gallery: Gallery::new(),
            notifications,
            hint: InteractionHint::new(now),
            loads: LoadTracker::new(),
            held: None,
            failed: Vec::new(),
            ids: IdGenerator::new(),
            config,
            decoder,
            max_texture_dimension,
        }
    }

    /// Register the presets, greet the user and start loading the first preset.
    pub fn start(&mut self, now: Instant) {
        for record in preset_panoramas(&self.config.preset_dir) {
            self.gallery.push(record);
        }
        log::info!(
            "Registered {} preset panoramas from '{}'",
            self.gallery.len(),
            self.config.preset_dir
        );
        self.notifications
            .push(NotificationKind::Success, messages::WELCOME, now);
        if let Some(first) = self.gallery.first().map(|r| r.id.clone()) {
            self.request_display(&first);
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn set_max_texture_dimension(&mut self, max: u32) {
        self.max_texture_dimension = max;
    }

    pub fn handle(&mut self, command: Command, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        match command {
            Command::Gesture(gesture) => self.apply_gesture(gesture, now),
            Command::Key(action) => self.apply_key(action, now, &mut effects),
            Command::ToggleAutoRotate => self.toggle_auto_rotate(),
            Command::ResetCamera => self.reset_camera(),
            Command::OpenFilePicker => effects.push(Effect::OpenFilePicker),
            Command::Select(id) => self.select(&id),
            Command::SelectNext => self.select_relative(true),
            Command::SelectPrevious => self.select_relative(false),
            Command::Delete(id) => self.delete(&id, now, &mut effects),
            Command::DeleteActive => match self.gallery.active_id().cloned() {
                Some(id) => self.delete(&id, now, &mut effects),
                None => log::debug!("Nothing active to delete"),
            },
            Command::FilesOffered(files) => self.offer_files(files, now),
            Command::DismissNotification(id) => {
                if !self.notifications.dismiss(id) {
                    log::debug!("Notification {} already gone", id);
                }
            }
            Command::Resized { width, height } => {
                if width > 0 && height > 0 {
                    self.state.aspect = width as f32 / height as f32;
                }
            }
            Command::ContextLost => {
                if !self.state.context_lost {
                    log::warn!("{}", ViewerError::RenderContextLost);
                    self.state.context_lost = true;
                    self.notifications
                        .push(NotificationKind::Warning, messages::CONTEXT_LOST, now);
                }
            }
            Command::ContextRestored => self.restore_context(),
        }
        effects
    }

    /// Per-frame tick: collect decode results, advance auto-rotation and
    /// expire notifications.
    pub fn frame(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        for outcome in self.decoder.poll() {
            self.finish_load(outcome, now, &mut effects);
        }

        if self.state.auto_rotate
            && !self.state.drag.is_dragging(now)
            && self.state.displayed.is_some()
        {
            self.state.sphere_rotation += self.config.viewer.auto_rotate_speed * AUTO_ROTATE_STEP;
        }

        self.notifications.expire(now);
        self.state.phase = if self.loads.is_loading() {
            Phase::Loading
        } else {
            Phase::Idle
        };
        effects
    }

    fn apply_gesture(&mut self, gesture: Gesture, now: Instant) {
        let tuning = &self.config.viewer;
        match gesture {
            Gesture::Press => {
                self.hint.dismiss();
                self.state.drag.press();
            }
            Gesture::Drag { dx, dy } => {
                self.state.orientation =
                    self.state.orientation.drag(dx, dy, tuning.drag_sensitivity);
            }
            Gesture::Pinch { change } => {
                self.state.orientation = self
                    .state
                    .orientation
                    .zoom(-change * tuning.pinch_sensitivity);
            }
            Gesture::Wheel { delta_y } => {
                self.state.orientation = self
                    .state
                    .orientation
                    .zoom(delta_y * tuning.wheel_sensitivity);
            }
            Gesture::Release => self.state.drag.release(now),
        }
    }

    fn apply_key(&mut self, action: KeyAction, now: Instant, effects: &mut Vec<Effect>) {
        let step = self.config.viewer.key_step;
        let rotate = |o: &Orientation, dir| o.step(dir, step);
        match action {
            KeyAction::RotateLeft => {
                self.state.orientation = rotate(&self.state.orientation, StepDirection::Left)
            }
            KeyAction::RotateRight => {
                self.state.orientation = rotate(&self.state.orientation, StepDirection::Right)
            }
            KeyAction::RotateUp => {
                self.state.orientation = rotate(&self.state.orientation, StepDirection::Up)
            }
            KeyAction::RotateDown => {
                self.state.orientation = rotate(&self.state.orientation, StepDirection::Down)
            }
            KeyAction::ToggleAutoRotate => self.toggle_auto_rotate(),
            KeyAction::ResetCamera => self.reset_camera(),
            KeyAction::OpenFilePicker => effects.push(Effect::OpenFilePicker),
            KeyAction::NextPanorama => self.select_relative(true),
            KeyAction::PreviousPanorama => self.select_relative(false),
            KeyAction::DeleteActive => {
                if let Some(id) = self.gallery.active_id().cloned() {
                    self.delete(&id, now, effects);
                }
            }
        }
    }

    fn toggle_auto_rotate(&mut self) {
        self.state.auto_rotate = !self.state.auto_rotate;
        log::debug!("Auto-rotate {}", if self.state.auto_rotate { "on" } else { "off" });
    }

    fn reset_camera(&mut self) {
        self.state.orientation = Orientation::reset_with_fov(self.config.viewer.reset_fov());
    }

    fn select(&mut self, id: &PanoramaId) {
        if self.gallery.contains(id) {
            self.request_display(id);
        } else {
            log::warn!("{}", ViewerError::UnknownPanorama(id.to_string()));
        }
    }

    fn select_relative(&mut self, forward: bool) {
        let target = match self.gallery.active_id() {
            Some(active) if forward => self.gallery.next_after(active),
            Some(active) => self.gallery.prev_before(active),
            None => self.gallery.first(),
        };
        if let Some(id) = target.map(|r| r.id.clone()) {
            self.request_display(&id);
        }
    }

    fn delete(&mut self, id: &PanoramaId, now: Instant, effects: &mut Vec<Effect>) {
        match self.gallery.remove(id) {
            Ok(was_active) => {
                log::info!("Deleted panorama {}", id);
                if was_active {
                    self.state.displayed = None;
                    effects.push(Effect::ClearScene);
                    self.failed.clear();
                    if let Some(next) = self.gallery.first().map(|r| r.id.clone()) {
                        self.request_display(&next);
                    }
                }
                self.notifications
                    .push(NotificationKind::Info, messages::DELETED, now);
            }
            Err(ViewerError::PresetProtected(_)) => {
                self.notifications
                    .push(NotificationKind::Warning, messages::PRESET_PROTECTED, now);
            }
            Err(e) => log::warn!("Delete refused: {}", e),
        }
    }

    fn offer_files(&mut self, files: Vec<FileInfo>, now: Instant) {
        let screening = ingest::screen(files, &self.config.upload);
        for _ in screening.oversized() {
            self.notifications.push(
                NotificationKind::Error,
                messages::file_too_large(self.config.upload.max_file_size),
                now,
            );
        }
        if screening.accepted.is_empty() {
            self.notifications
                .push(NotificationKind::Error, messages::VALIDATION_ERROR, now);
            return;
        }

        for file in screening.accepted {
            let ticket = self.loads.issue();
            log::info!("Decoding upload {} ({} bytes)", file.name, file.size);
            self.decoder.submit(DecodeJob {
                ticket,
                purpose: DecodePurpose::Upload {
                    name: file.name.clone(),
                    size: file.size,
                },
                label: file.name,
                input: DecodeInput::File(file.handle),
                max_dimension: self.max_texture_dimension,
            });
        }
        self.state.phase = Phase::Loading;
    }

    fn request_display(&mut self, id: &PanoramaId) {
        let Some(record) = self.gallery.get(id) else {
            return;
        };
        let ticket = self.loads.issue();
        log::debug!("Loading panorama {} (ticket {})", id, ticket.value());
        let job = DecodeJob {
            ticket,
            purpose: DecodePurpose::Display(id.clone()),
            label: record.name.clone(),
            input: DecodeInput::Source(record.source.clone()),
            max_dimension: self.max_texture_dimension,
        };
        self.decoder.submit(job);
        self.state.phase = Phase::Loading;
    }

    fn finish_load(&mut self, outcome: DecodeOutcome, now: Instant, effects: &mut Vec<Effect>) {
        let ticket = outcome.ticket;
        self.loads.complete(ticket);
        match (outcome.purpose, outcome.result) {
            (DecodePurpose::Display(id), Ok(image)) => self.offer(ticket, id, image, effects),
            (DecodePurpose::Upload { name, size }, Ok(image)) => {
                if !ingest::aspect_ratio_ok(image.width, image.height, &self.config.upload) {
                    self.notifications
                        .push(NotificationKind::Warning, messages::ASPECT_WARNING, now);
                }
                let id = self.ids.next_id();
                self.gallery.push(PanoramaRecord {
                    id: id.clone(),
                    name: name.clone(),
                    source: ImageSource::Embedded(image.source_bytes.clone()),
                    origin: Origin::User,
                    size: Some(size),
                    dimensions: Some(format_dimensions(image.width, image.height)),
                });
                self.offer(ticket, id, image, effects);
                self.notifications
                    .push(NotificationKind::Success, messages::loaded(&name), now);
            }
            (purpose, Err(e)) => {
                log::warn!("Load of {} failed: {}", outcome.label, e);
                // One report per run of display failures.
                let repeated =
                    matches!(purpose, DecodePurpose::Display(_)) && !self.failed.is_empty();
                if !repeated {
                    self.notifications
                        .push(NotificationKind::Error, messages::LOADING_ERROR, now);
                }
                if let DecodePurpose::Display(id) = purpose {
                    self.failed.push(id);
                }
            }
        }
        self.release_held(effects);
        self.fall_back();
    }

    /// Route a successful result by its ticket.
    fn offer(
        &mut self,
        ticket: LoadTicket,
        id: PanoramaId,
        image: DecodedImage,
        effects: &mut Vec<Effect>,
    ) {
        match self.loads.verdict(ticket) {
            Verdict::Show => self.show(ticket, id, image, effects),
            Verdict::Hold => {
                log::debug!("Holding {} until newer requests finish", id);
                if self.held.as_ref().is_none_or(|held| held.ticket < ticket) {
                    self.held = Some(Held { ticket, id, image });
                }
            }
            Verdict::Stale => log::debug!("Dropping stale result for {}", id),
        }
    }

    /// Display the held result once every newer request has failed.
    fn release_held(&mut self, effects: &mut Vec<Effect>) {
        let Some(held) = self.held.take() else {
            return;
        };
        match self.loads.verdict(held.ticket) {
            Verdict::Show => self.show(held.ticket, held.id, held.image, effects),
            Verdict::Hold => self.held = Some(held),
            Verdict::Stale => {}
        }
    }

    /// With nothing on screen and nothing left in flight, try the next entry
    /// that has not failed yet.
    fn fall_back(&mut self) {
        if self.state.displayed.is_some() || self.held.is_some() || self.loads.is_loading() {
            return;
        }
        let next = self
            .gallery
            .records()
            .iter()
            .find(|r| !self.failed.contains(&r.id))
            .map(|r| r.id.clone());
        match next {
            Some(id) => {
                log::info!("Falling back to panorama {}", id);
                self.request_display(&id);
            }
            None if !self.gallery.is_empty() => log::warn!("No panorama could be displayed"),
            None => {}
        }
    }

    fn show(
        &mut self,
        ticket: LoadTicket,
        id: PanoramaId,
        image: DecodedImage,
        effects: &mut Vec<Effect>,
    ) {
        if let Err(e) = self.gallery.set_active(&id) {
            log::warn!("Cannot activate {}: {}", id, e);
            return;
        }
        log::info!("Displaying panorama {} ({}x{})", id, image.width, image.height);
        self.loads.mark_shown(ticket);
        self.failed.clear();
        self.state.displayed = Some(id);
        self.state.orientation = Orientation::reset_with_fov(self.config.viewer.reset_fov());
        self.state.sphere_rotation = 0.0;
        effects.push(Effect::ShowTexture(image));
    }

    fn restore_context(&mut self) {
        self.state.context_lost = false;
        let target = self
            .state
            .displayed
            .clone()
            .or_else(|| self.gallery.active_id().cloned())
            .or_else(|| self.gallery.first().map(|r| r.id.clone()));
        if let Some(id) = target {
            log::info!("Rendering context restored, reloading {}", id);
            self.request_display(&id);
        }
    }

    /// Surface a failure from outside the controller, such as a texture upload.
    pub fn report(&mut self, error: &ViewerError, now: Instant) {
        log::error!("{}", error);
        self.notifications
            .push(NotificationKind::Error, messages::LOADING_ERROR, now);
    }

    pub fn is_hint_visible(&self, now: Instant) -> bool {
        self.hint.is_visible(now)
    }

    fn hint_text(&self, now: Instant) -> Option<&'static str> {
        self.hint
            .is_visible(now)
            .then_some(messages::INTERACTION_HINT)
    }

    pub fn snapshot(&self, now: Instant) -> ViewerSnapshot {
        let o = &self.state.orientation;
        ViewerSnapshot {
            yaw: o.yaw,
            pitch: o.pitch,
            fov_deg: o.fov_deg,
            sphere_rotation: self.state.sphere_rotation,
            auto_rotate: self.state.auto_rotate,
            dragging: self.state.drag.is_dragging(now),
            phase: self.state.phase,
            displayed: self.state.displayed.as_ref().map(|id| id.to_string()),
            counter: self.gallery.counter_label(),
            gallery: self.gallery.entries(),
            notifications: self.notifications.views(),
            hint: self.hint_text(now),
            prompt: self.gallery.is_empty().then_some(messages::DRAG_DROP),
        }
    }

    /// Window title: app name, active panorama, counter and newest message,
    /// or the hint/upload prompt when there is no message.
    pub fn window_title(&self, now: Instant) -> String {
        let mut title = window::TITLE.to_string();
        if let Some(active) = self.gallery.active() {
            title.push_str(&format!(" | {}", active.name));
        }
        title.push_str(&format!(" | {}", self.gallery.counter_label()));
        if self.state.phase == Phase::Loading {
            title.push_str(" | …");
        }
        let extra = self
            .notifications
            .latest()
            .map(|n| n.message.as_str())
            .or_else(|| self.hint_text(now))
            .or_else(|| self.gallery.is_empty().then_some(messages::DRAG_DROP));
        if let Some(extra) = extra {
            title.push_str(&format!(" | {}", extra));
        }
        title
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::f32::consts::FRAC_PI_2;
    use std::rc::Rc;
    use std::sync::Arc;

    use image::ImageFormat;

    use super::*;
    use crate::decode::tests::encoded;
    use crate::decode::{ImmediateDecoder, run_job_blocking};
    use crate::ingest::FileHandle;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    /// Holds jobs until the test releases them, in any order.
    #[derive(Clone, Default)]
    struct ManualDecoder {
        queued: Rc<RefCell<Vec<DecodeJob>>>,
        released: Rc<RefCell<Vec<DecodeOutcome>>>,
    }

    impl ManualDecoder {
        fn release(&self, index: usize) {
            let job = self.queued.borrow_mut().remove(index);
            self.released.borrow_mut().push(run_job_blocking(job));
        }

        fn queued(&self) -> usize {
            self.queued.borrow().len()
        }
    }

    impl DecodeBackend for ManualDecoder {
        fn submit(&mut self, job: DecodeJob) {
            self.queued.borrow_mut().push(job);
        }

        fn poll(&mut self) -> Vec<DecodeOutcome> {
            std::mem::take(&mut *self.released.borrow_mut())
        }
    }

    fn viewer_with(decoder: Box<dyn DecodeBackend>) -> Viewer {
        Viewer::new(AppConfig::default(), decoder, 8192, Instant::now())
    }

    fn user_file(name: &str, width: u32, height: u32) -> FileInfo {
        FileInfo::from_bytes(name, "image/png", encoded(width, height, ImageFormat::Png))
    }

    fn shown(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, Effect::ShowTexture(_)))
            .count()
    }

    fn messages_of(viewer: &Viewer) -> Vec<(NotificationKind, String)> {
        viewer
            .notifications()
            .active()
            .iter()
            .map(|n| (n.kind, n.message.clone()))
            .collect()
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn preset_dir_with_images() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "panoview-presets-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["p1.jpg", "p2.jpg", "p3.jpg", "p4.jpg", "p5.jpg", "p6.jpeg"] {
            std::fs::write(dir.join(name), encoded(32, 16, ImageFormat::Jpeg)).unwrap();
        }
        dir
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_startup_with_six_presets() {
        let dir = preset_dir_with_images();
        let config = AppConfig {
            preset_dir: dir.display().to_string(),
            ..AppConfig::default()
        };
        let now = Instant::now();
        let mut viewer = Viewer::new(config, Box::new(ImmediateDecoder::new()), 8192, now);
        viewer.start(now);

        assert_eq!(viewer.gallery().counter_label(), "6 изображений");
        let effects = viewer.frame(now);
        assert_eq!(shown(&effects), 1);
        assert_eq!(viewer.state().displayed, Some(PanoramaId::new("p1")));
        assert_eq!(viewer.gallery().active_id(), Some(&PanoramaId::new("p1")));
        assert_eq!(viewer.gallery().active_count(), 1);
        assert_eq!(viewer.state().phase, Phase::Idle);
        assert_eq!(
            messages_of(&viewer),
            vec![(NotificationKind::Success, messages::WELCOME.to_string())]
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_preset_keeps_previous_and_reports() {
        let config = AppConfig {
            preset_dir: "/nonexistent/panoview".to_string(),
            ..AppConfig::default()
        };
        let now = Instant::now();
        let mut viewer = Viewer::new(config, Box::new(ImmediateDecoder::new()), 8192, now);
        viewer.start(now);
        let effects = viewer.frame(now);
        assert_eq!(shown(&effects), 0);
        assert_eq!(viewer.state().displayed, None);
        assert!(messages_of(&viewer)
            .contains(&(NotificationKind::Error, messages::LOADING_ERROR.to_string())));

        // The remaining presets are tried in turn, reported once.
        for _ in 0..6 {
            viewer.frame(now);
        }
        assert_eq!(viewer.state().displayed, None);
        assert_eq!(viewer.gallery().active_count(), 0);
        assert_eq!(viewer.state().phase, Phase::Idle);
        let errors = messages_of(&viewer)
            .into_iter()
            .filter(|(kind, _)| *kind == NotificationKind::Error)
            .count();
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_failed_select_keeps_previous_displayed() {
        let decoder = ManualDecoder::default();
        let mut viewer = viewer_with(Box::new(decoder.clone()));
        let now = Instant::now();
        viewer.start(now);
        decoder.queued.borrow_mut()[0].input = DecodeInput::Source(ImageSource::Embedded(
            Arc::from(encoded(16, 8, ImageFormat::Jpeg)),
        ));
        decoder.release(0);
        viewer.frame(now);
        let p1 = PanoramaId::new("p1");
        assert_eq!(viewer.state().displayed.as_ref(), Some(&p1));

        // p2 has no file behind it.
        viewer.handle(Command::Select(PanoramaId::new("p2")), now);
        decoder.release(0);
        let effects = viewer.frame(now);
        assert_eq!(shown(&effects), 0);
        assert_eq!(viewer.state().displayed.as_ref(), Some(&p1));
        assert_eq!(viewer.gallery().active_id(), Some(&p1));
        assert_eq!(viewer.gallery().active_count(), 1);
        assert_eq!(viewer.state().phase, Phase::Idle);
        assert_eq!(decoder.queued(), 0);
        assert!(messages_of(&viewer)
            .contains(&(NotificationKind::Error, messages::LOADING_ERROR.to_string())));
    }

    #[test]
    fn test_older_result_shown_when_newer_request_fails() {
        let decoder = ManualDecoder::default();
        let mut viewer = viewer_with(Box::new(decoder.clone()));
        let now = Instant::now();
        viewer.start(now);
        decoder.queued.borrow_mut()[0].input = DecodeInput::Source(ImageSource::Embedded(
            Arc::from(encoded(16, 8, ImageFormat::Jpeg)),
        ));
        let bad = FileInfo::from_bytes("broken.jpg", "image/jpeg", vec![0xFF, 0xD8, 0x00]);
        viewer.handle(Command::FilesOffered(vec![bad]), now);
        assert_eq!(decoder.queued(), 2);

        // The preset finishes while the upload is still pending, then the
        // upload fails.
        decoder.release(0);
        decoder.release(0);
        let effects = viewer.frame(now);
        let p1 = PanoramaId::new("p1");
        assert_eq!(shown(&effects), 1);
        assert_eq!(viewer.state().displayed.as_ref(), Some(&p1));
        assert_eq!(viewer.gallery().active_id(), Some(&p1));
        assert_eq!(viewer.gallery().active_count(), 1);
        assert_eq!(viewer.state().phase, Phase::Idle);
        assert!(messages_of(&viewer)
            .contains(&(NotificationKind::Error, messages::LOADING_ERROR.to_string())));
    }

    #[test]
    fn test_older_result_waits_for_pending_newer_request() {
        let decoder = ManualDecoder::default();
        let mut viewer = viewer_with(Box::new(decoder.clone()));
        let now = Instant::now();
        viewer.start(now);
        decoder.queued.borrow_mut()[0].input = DecodeInput::Source(ImageSource::Embedded(
            Arc::from(encoded(16, 8, ImageFormat::Jpeg)),
        ));
        viewer.handle(Command::FilesOffered(vec![user_file("a.png", 8, 4)]), now);

        decoder.release(0);
        let effects = viewer.frame(now);
        assert_eq!(shown(&effects), 0);
        assert_eq!(viewer.state().displayed, None);
        assert_eq!(viewer.state().phase, Phase::Loading);

        // The newer upload wins; the held preset is discarded.
        decoder.release(0);
        let effects = viewer.frame(now);
        assert_eq!(shown(&effects), 1);
        let displayed = viewer.state().displayed.clone().unwrap();
        assert_eq!(viewer.gallery().get(&displayed).unwrap().name, "a.png");
        assert_eq!(viewer.gallery().active_id(), Some(&displayed));
        assert_eq!(viewer.state().phase, Phase::Idle);
    }

    #[test]
    fn test_upload_is_added_and_shown() {
        let mut viewer = viewer_with(Box::new(ImmediateDecoder::new()));
        let now = Instant::now();
        viewer.handle(Command::FilesOffered(vec![user_file("hall.png", 64, 32)]), now);
        let effects = viewer.frame(now);

        assert_eq!(shown(&effects), 1);
        assert_eq!(viewer.gallery().len(), 1);
        let record = &viewer.gallery().records()[0];
        assert_eq!(record.name, "hall.png");
        assert_eq!(record.origin, Origin::User);
        assert_eq!(record.dimensions.as_deref(), Some("64 × 32"));
        assert_eq!(viewer.state().displayed.as_ref(), Some(&record.id));
        assert_eq!(
            messages_of(&viewer),
            vec![(NotificationKind::Success, messages::loaded("hall.png"))]
        );
    }

    #[test]
    fn test_aspect_warning_only_for_non_panoramic() {
        let mut viewer = viewer_with(Box::new(ImmediateDecoder::new()));
        let now = Instant::now();
        viewer.handle(
            Command::FilesOffered(vec![user_file("wide.png", 3000, 1500)]),
            now,
        );
        viewer.frame(now);
        assert!(!messages_of(&viewer)
            .iter()
            .any(|(kind, _)| *kind == NotificationKind::Warning));

        viewer.handle(
            Command::FilesOffered(vec![user_file("square.png", 3000, 3000)]),
            now,
        );
        viewer.frame(now);
        let warnings: Vec<_> = messages_of(&viewer)
            .into_iter()
            .filter(|(kind, _)| *kind == NotificationKind::Warning)
            .collect();
        assert_eq!(
            warnings,
            vec![(NotificationKind::Warning, messages::ASPECT_WARNING.to_string())]
        );
        // Still accepted.
        assert_eq!(viewer.gallery().len(), 2);
    }

    #[test]
    fn test_oversized_file_rejected() {
        let decoder = ManualDecoder::default();
        let mut viewer = viewer_with(Box::new(decoder.clone()));
        let now = Instant::now();
        let big = FileInfo::new(
            "huge.jpg",
            "image/jpeg",
            52_428_801,
            FileHandle::Bytes(Arc::from(Vec::new())),
        );
        viewer.handle(Command::FilesOffered(vec![big]), now);

        assert_eq!(viewer.gallery().len(), 0);
        assert_eq!(decoder.queued(), 0);
        assert_eq!(
            messages_of(&viewer),
            vec![
                (
                    NotificationKind::Error,
                    "Файл слишком большой. Максимальный размер: 50MB".to_string()
                ),
                (NotificationKind::Error, messages::VALIDATION_ERROR.to_string()),
            ]
        );
    }

    #[test]
    fn test_unsupported_type_never_added() {
        let decoder = ManualDecoder::default();
        let mut viewer = viewer_with(Box::new(decoder.clone()));
        let now = Instant::now();
        let gif = FileInfo::from_bytes("anim.gif", "image/gif", vec![0u8; 16]);
        let text = FileInfo::from_bytes("notes.txt", "", vec![0u8; 16]);
        viewer.handle(Command::FilesOffered(vec![gif, text]), now);
        viewer.frame(now);

        assert_eq!(decoder.queued(), 0);
        assert!(viewer.gallery().is_empty());
        assert_eq!(
            messages_of(&viewer),
            vec![(NotificationKind::Error, messages::VALIDATION_ERROR.to_string())]
        );
    }

    #[test]
    fn test_mixed_batch_only_valid_decoded() {
        let decoder = ManualDecoder::default();
        let mut viewer = viewer_with(Box::new(decoder.clone()));
        let now = Instant::now();
        let gif = FileInfo::from_bytes("anim.gif", "image/gif", vec![0u8; 16]);
        viewer.handle(
            Command::FilesOffered(vec![gif, user_file("ok.png", 8, 4)]),
            now,
        );
        assert_eq!(decoder.queued(), 1);
        assert!(viewer.notifications().active().is_empty());
    }

    #[test]
    fn test_corrupt_upload_adds_nothing() {
        let mut viewer = viewer_with(Box::new(ImmediateDecoder::new()));
        let now = Instant::now();
        let bad = FileInfo::from_bytes("broken.jpg", "image/jpeg", vec![0xFF, 0xD8, 0x00]);
        viewer.handle(Command::FilesOffered(vec![bad]), now);
        let effects = viewer.frame(now);
        assert_eq!(shown(&effects), 0);
        assert!(viewer.gallery().is_empty());
        assert_eq!(
            messages_of(&viewer),
            vec![(NotificationKind::Error, messages::LOADING_ERROR.to_string())]
        );
    }

    #[test]
    fn test_later_request_wins_when_completed_out_of_order() {
        let decoder = ManualDecoder::default();
        let mut viewer = viewer_with(Box::new(decoder.clone()));
        let now = Instant::now();
        viewer.handle(
            Command::FilesOffered(vec![user_file("a.png", 8, 4), user_file("b.png", 8, 4)]),
            now,
        );
        viewer.frame(now);
        assert_eq!(viewer.state().phase, Phase::Loading);

        // Second request completes first.
        decoder.release(1);
        let effects = viewer.frame(now);
        assert_eq!(shown(&effects), 1);
        let b_id = viewer.state().displayed.clone().unwrap();
        assert_eq!(viewer.gallery().get(&b_id).unwrap().name, "b.png");
        assert_eq!(viewer.state().phase, Phase::Idle);

        // First request completes late: added, not shown.
        decoder.release(0);
        let effects = viewer.frame(now);
        assert_eq!(shown(&effects), 0);
        assert_eq!(viewer.gallery().len(), 2);
        assert_eq!(viewer.state().displayed, Some(b_id.clone()));
        assert_eq!(viewer.gallery().active_id(), Some(&b_id));
    }

    #[test]
    fn test_stale_display_dropped() {
        let mut viewer = viewer_with(Box::new(ImmediateDecoder::new()));
        let now = Instant::now();
        viewer.handle(
            Command::FilesOffered(vec![user_file("a.png", 8, 4), user_file("b.png", 8, 4)]),
            now,
        );
        viewer.frame(now);
        let ids: Vec<_> = viewer.gallery().records().iter().map(|r| r.id.clone()).collect();

        let decoder = ManualDecoder::default();
        viewer.decoder = Box::new(decoder.clone());
        viewer.handle(Command::Select(ids[0].clone()), now);
        viewer.handle(Command::Select(ids[1].clone()), now);
        viewer.handle(Command::Select(ids[0].clone()), now);
        decoder.release(2);
        decoder.release(0);
        decoder.release(0);
        let effects = viewer.frame(now);
        assert_eq!(shown(&effects), 1);
        assert_eq!(viewer.state().displayed.as_ref(), Some(&ids[0]));
    }

    #[test]
    fn test_load_resets_camera() {
        let mut viewer = viewer_with(Box::new(ImmediateDecoder::new()));
        let now = Instant::now();
        viewer.handle(Command::Gesture(Gesture::Wheel { delta_y: 200.0 }), now);
        viewer.handle(Command::Key(KeyAction::RotateRight), now);
        viewer.handle(Command::FilesOffered(vec![user_file("a.png", 8, 4)]), now);
        viewer.frame(now);
        let o = viewer.state().orientation;
        assert_eq!((o.yaw, o.pitch, o.fov_deg), (0.0, 0.0, 75.0));
        assert_eq!(viewer.state().sphere_rotation, 0.0);
    }

    #[test]
    fn test_delete_active_upload_displays_first() {
        let mut viewer = viewer_with(Box::new(ImmediateDecoder::new()));
        let now = Instant::now();
        viewer.handle(
            Command::FilesOffered(vec![user_file("a.png", 8, 4), user_file("b.png", 8, 4)]),
            now,
        );
        viewer.frame(now);
        let active = viewer.state().displayed.clone().unwrap();
        let effects = viewer.handle(Command::Delete(active), now);
        assert!(matches!(effects.as_slice(), [Effect::ClearScene]));
        assert_eq!(viewer.gallery().len(), 1);
        // Nothing is active until the replacement has decoded.
        assert_eq!(viewer.gallery().active_count(), 0);
        assert_eq!(viewer.state().displayed, None);

        let effects = viewer.frame(now);
        assert_eq!(shown(&effects), 1);
        let remaining = viewer.gallery().records()[0].id.clone();
        assert_eq!(viewer.gallery().active_id(), Some(&remaining));
        assert_eq!(viewer.state().displayed, Some(remaining));
        assert!(messages_of(&viewer)
            .contains(&(NotificationKind::Info, messages::DELETED.to_string())));
    }

    #[test]
    fn test_delete_active_skips_unreadable_entries() {
        let config = AppConfig {
            preset_dir: "/nonexistent/panoview".to_string(),
            ..AppConfig::default()
        };
        let now = Instant::now();
        let mut viewer = Viewer::new(config, Box::new(ImmediateDecoder::new()), 8192, now);
        viewer.start(now);
        viewer.handle(
            Command::FilesOffered(vec![user_file("a.png", 8, 4), user_file("b.png", 8, 4)]),
            now,
        );
        viewer.frame(now);
        let b = viewer.state().displayed.clone().unwrap();
        assert_eq!(viewer.gallery().get(&b).unwrap().name, "b.png");

        viewer.handle(Command::Delete(b), now);
        for _ in 0..8 {
            viewer.frame(now);
            assert_eq!(viewer.gallery().active_id(), viewer.state().displayed.as_ref());
        }
        let a = viewer.state().displayed.clone().unwrap();
        assert_eq!(viewer.gallery().get(&a).unwrap().name, "a.png");
        assert_eq!(viewer.gallery().active_count(), 1);
        assert_eq!(viewer.state().phase, Phase::Idle);
    }

    #[test]
    fn test_delete_only_readable_entry_leaves_nothing_dangling() {
        let config = AppConfig {
            preset_dir: "/nonexistent/panoview".to_string(),
            ..AppConfig::default()
        };
        let now = Instant::now();
        let mut viewer = Viewer::new(config, Box::new(ImmediateDecoder::new()), 8192, now);
        viewer.start(now);
        viewer.handle(Command::FilesOffered(vec![user_file("a.png", 8, 4)]), now);
        viewer.frame(now);
        let a = viewer.state().displayed.clone().unwrap();

        let effects = viewer.handle(Command::Delete(a), now);
        assert!(matches!(effects.as_slice(), [Effect::ClearScene]));
        for _ in 0..8 {
            assert_eq!(shown(&viewer.frame(now)), 0);
        }
        assert_eq!(viewer.state().displayed, None);
        assert_eq!(viewer.gallery().active_id(), None);
        assert_eq!(viewer.gallery().len(), 6);
        assert_eq!(viewer.state().phase, Phase::Idle);
    }

    #[test]
    fn test_delete_last_clears_scene() {
        let mut viewer = viewer_with(Box::new(ImmediateDecoder::new()));
        let now = Instant::now();
        viewer.handle(Command::FilesOffered(vec![user_file("a.png", 8, 4)]), now);
        viewer.frame(now);
        let effects = viewer.handle(Command::DeleteActive, now);
        assert!(matches!(effects.as_slice(), [Effect::ClearScene]));
        assert!(viewer.gallery().is_empty());
        assert_eq!(viewer.state().displayed, None);
    }

    #[test]
    fn test_preset_delete_refused() {
        let mut viewer = viewer_with(Box::new(ManualDecoder::default()));
        let now = Instant::now();
        viewer.start(now);
        viewer.handle(Command::Delete(PanoramaId::new("p3")), now);
        assert_eq!(viewer.gallery().len(), 6);
        assert!(messages_of(&viewer)
            .contains(&(NotificationKind::Warning, messages::PRESET_PROTECTED.to_string())));
    }

    #[test]
    fn test_unknown_select_is_ignored() {
        let decoder = ManualDecoder::default();
        let mut viewer = viewer_with(Box::new(decoder.clone()));
        viewer.handle(Command::Select(PanoramaId::new("nope")), Instant::now());
        assert_eq!(decoder.queued(), 0);
    }

    #[test]
    fn test_drag_and_pitch_clamp() {
        let mut viewer = viewer_with(Box::new(ManualDecoder::default()));
        let now = Instant::now();
        viewer.handle(Command::Gesture(Gesture::Press), now);
        viewer.handle(Command::Gesture(Gesture::Drag { dx: 10.0, dy: 0.0 }), now);
        assert!(approx_eq(viewer.state().orientation.yaw, 0.1));
        for _ in 0..100 {
            viewer.handle(Command::Gesture(Gesture::Drag { dx: 0.0, dy: 50.0 }), now);
        }
        assert!(approx_eq(viewer.state().orientation.pitch, FRAC_PI_2));
        assert!(!viewer.is_hint_visible(now + Duration::from_millis(1500)));
    }

    #[test]
    fn test_wheel_and_pinch_zoom_clamped() {
        let mut viewer = viewer_with(Box::new(ManualDecoder::default()));
        let now = Instant::now();
        viewer.handle(Command::Gesture(Gesture::Wheel { delta_y: 100.0 }), now);
        assert!(approx_eq(viewer.state().orientation.fov_deg, 80.0));
        viewer.handle(Command::Gesture(Gesture::Pinch { change: 50.0 }), now);
        assert!(approx_eq(viewer.state().orientation.fov_deg, 75.0));
        viewer.handle(Command::Gesture(Gesture::Wheel { delta_y: 10_000.0 }), now);
        assert_eq!(viewer.state().orientation.fov_deg, 100.0);
        viewer.handle(Command::Gesture(Gesture::Wheel { delta_y: -10_000.0 }), now);
        assert_eq!(viewer.state().orientation.fov_deg, 10.0);
        assert_eq!(viewer.state().orientation.yaw, 0.0);
    }

    #[test]
    fn test_auto_rotate_paused_while_dragging() {
        let mut viewer = viewer_with(Box::new(ImmediateDecoder::new()));
        let start = Instant::now();
        viewer.handle(Command::FilesOffered(vec![user_file("a.png", 8, 4)]), start);
        viewer.frame(start);
        viewer.handle(Command::ToggleAutoRotate, start);

        viewer.frame(start);
        assert!(approx_eq(viewer.state().sphere_rotation, 0.005));

        viewer.handle(Command::Gesture(Gesture::Press), start);
        viewer.frame(start);
        assert!(approx_eq(viewer.state().sphere_rotation, 0.005));

        viewer.handle(Command::Gesture(Gesture::Release), start);
        viewer.frame(start + Duration::from_millis(50));
        assert!(approx_eq(viewer.state().sphere_rotation, 0.005));
        viewer.frame(start + Duration::from_millis(150));
        assert!(approx_eq(viewer.state().sphere_rotation, 0.010));
    }

    #[test]
    fn test_auto_rotate_needs_a_panorama() {
        let mut viewer = viewer_with(Box::new(ManualDecoder::default()));
        let now = Instant::now();
        viewer.handle(Command::ToggleAutoRotate, now);
        viewer.frame(now);
        assert_eq!(viewer.state().sphere_rotation, 0.0);
    }

    #[test]
    fn test_reset_camera() {
        let mut viewer = viewer_with(Box::new(ManualDecoder::default()));
        let now = Instant::now();
        viewer.handle(Command::Key(KeyAction::RotateUp), now);
        viewer.handle(Command::Key(KeyAction::RotateLeft), now);
        viewer.handle(Command::Gesture(Gesture::Wheel { delta_y: -100.0 }), now);
        viewer.handle(Command::ResetCamera, now);
        let o = viewer.state().orientation;
        assert_eq!((o.yaw, o.pitch, o.fov_deg), (0.0, 0.0, 75.0));
    }

    #[test]
    fn test_context_restore_reloads_displayed() {
        let mut viewer = viewer_with(Box::new(ImmediateDecoder::new()));
        let now = Instant::now();
        viewer.handle(
            Command::FilesOffered(vec![user_file("a.png", 8, 4), user_file("b.png", 8, 4)]),
            now,
        );
        viewer.frame(now);
        let displayed = viewer.state().displayed.clone();

        viewer.handle(Command::ContextLost, now);
        assert!(viewer.state().context_lost);
        viewer.handle(Command::ContextRestored, now);
        let effects = viewer.frame(now);
        assert_eq!(shown(&effects), 1);
        assert_eq!(viewer.state().displayed, displayed);
        assert!(!viewer.state().context_lost);
    }

    #[test]
    fn test_next_and_previous_wrap() {
        let decoder = ManualDecoder::default();
        let mut viewer = viewer_with(Box::new(decoder.clone()));
        let now = Instant::now();
        viewer.start(now);
        decoder.queued.borrow_mut()[0].input = DecodeInput::Source(ImageSource::Embedded(
            Arc::from(encoded(16, 8, ImageFormat::Jpeg)),
        ));
        decoder.release(0);
        viewer.frame(now);
        assert_eq!(viewer.gallery().active_id(), Some(&PanoramaId::new("p1")));

        viewer.handle(Command::SelectPrevious, now);
        let job = decoder.queued.borrow()[0].purpose.clone();
        assert_eq!(job, DecodePurpose::Display(PanoramaId::new("p6")));
    }

    #[test]
    fn test_open_picker_effect() {
        let mut viewer = viewer_with(Box::new(ManualDecoder::default()));
        let effects = viewer.handle(Command::Key(KeyAction::OpenFilePicker), Instant::now());
        assert!(matches!(effects.as_slice(), [Effect::OpenFilePicker]));
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut viewer = viewer_with(Box::new(ManualDecoder::default()));
        let now = Instant::now();
        viewer.start(now);
        let json = serde_json::to_value(viewer.snapshot(now)).unwrap();
        assert_eq!(json["counter"], "6 изображений");
        assert_eq!(json["phase"], "loading");
        assert_eq!(json["gallery"][0]["origin_label"], "Демо");
        assert_eq!(json["gallery"][0]["dimensions"], "N/A");
        assert_eq!(json["notifications"][0]["kind"], "success");
        assert!(json["prompt"].is_null());
    }

    #[test]
    fn test_window_title() {
        let mut viewer = viewer_with(Box::new(ImmediateDecoder::new()));
        let now = Instant::now();
        viewer.handle(Command::FilesOffered(vec![user_file("a.png", 8, 4)]), now);
        viewer.frame(now);
        let title = viewer.window_title(now);
        assert!(title.starts_with(window::TITLE));
        assert!(title.contains("a.png"));
        assert!(title.contains("1 изображение"));
        assert!(title.ends_with(&messages::loaded("a.png")));

        let empty = viewer_with(Box::new(ManualDecoder::default()));
        assert!(empty.window_title(now).ends_with(messages::DRAG_DROP));
        let later = now + Duration::from_millis(1500);
        assert!(empty.window_title(later).ends_with(messages::INTERACTION_HINT));
    }
}
