//! Asynchronous panorama decoding.
//!
//! A [`DecodeJob`] names what to decode and why; a [`DecodeBackend`] runs it
//! off the event loop and hands back [`DecodeOutcome`]s when polled. Every job
//! carries a [`LoadTicket`] so the controller can tell whether its result is
//! still the most recent display request.

use std::collections::BTreeSet;
use std::sync::Arc;

use image::imageops::FilterType;

use crate::error::{Result, ViewerError};
use crate::ingest::FileHandle;
use crate::panorama::{ImageSource, PanoramaId};

#[cfg(not(target_arch = "wasm32"))]
mod native;
#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(not(target_arch = "wasm32"))]
pub use native::ThreadDecoder;
#[cfg(target_arch = "wasm32")]
pub use web::LocalDecoder;

/// Id of a display request, increasing with every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Issues tickets, remembers which are still running and which one is on
/// screen.
///
/// A result is displayed only when no newer request is still running and
/// nothing newer is already displayed.
#[derive(Debug, Default)]
pub struct LoadTracker {
    issued: u64,
    pending: BTreeSet<u64>,
    shown: u64,
}

/// What to do with a successfully decoded result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Newest live request: display it.
    Show,
    /// A newer request is still running; keep this in case that one fails.
    Hold,
    /// Something newer is already displayed.
    Stale,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding all earlier ones.
    pub fn issue(&mut self) -> LoadTicket {
        self.issued += 1;
        self.pending.insert(self.issued);
        LoadTicket(self.issued)
    }

    /// Record a finished job, whether it succeeded or not.
    pub fn complete(&mut self, ticket: LoadTicket) {
        self.pending.remove(&ticket.0);
    }

    /// Decide what a successful result for `ticket` should do.
    pub fn verdict(&self, ticket: LoadTicket) -> Verdict {
        if ticket.0 <= self.shown {
            Verdict::Stale
        } else if self.pending.range(ticket.0 + 1..).next().is_some() {
            Verdict::Hold
        } else {
            Verdict::Show
        }
    }

    /// Record that `ticket`'s result is now on screen.
    pub fn mark_shown(&mut self, ticket: LoadTicket) {
        self.shown = self.shown.max(ticket.0);
    }

    /// Whether a request newer than the displayed one is still running.
    pub fn is_loading(&self) -> bool {
        self.pending.range(self.shown + 1..).next().is_some()
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

/// Why a job was submitted.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodePurpose {
    /// Show an existing gallery record.
    Display(PanoramaId),
    /// Decode an accepted upload; a record is created on success.
    Upload { name: String, size: u64 },
}

/// Bytes to decode.
#[derive(Debug, Clone)]
pub enum DecodeInput {
    Source(ImageSource),
    File(FileHandle),
}

impl DecodeInput {
    /// Read the bytes synchronously where the platform allows it.
    pub fn read_blocking(&self, label: &str) -> Result<Arc<[u8]>> {
        match self {
            DecodeInput::Source(ImageSource::Embedded(bytes))
            | DecodeInput::File(FileHandle::Bytes(bytes)) => Ok(bytes.clone()),
            #[cfg(not(target_arch = "wasm32"))]
            DecodeInput::Source(ImageSource::Path(path)) => std::fs::read(path)
                .map(Arc::from)
                .map_err(|e| ViewerError::decode(label, e)),
            #[cfg(not(target_arch = "wasm32"))]
            DecodeInput::File(FileHandle::Path(path)) => std::fs::read(path)
                .map(Arc::from)
                .map_err(|e| ViewerError::decode(label, e)),
            #[cfg(target_arch = "wasm32")]
            _ => Err(ViewerError::decode(
                label,
                "synchronous read is not available in the browser",
            )),
        }
    }
}

/// One unit of decode work.
#[derive(Debug, Clone)]
pub struct DecodeJob {
    pub ticket: LoadTicket,
    pub purpose: DecodePurpose,
    /// Display name used in errors and logs.
    pub label: String,
    pub input: DecodeInput,
    /// Largest texture edge the GPU accepts.
    pub max_dimension: u32,
}

/// A decoded image ready for texture upload.
#[derive(Clone)]
pub struct DecodedImage {
    /// Source width in pixels, before any downscale.
    pub width: u32,
    /// Source height in pixels, before any downscale.
    pub height: u32,
    pub texture_width: u32,
    pub texture_height: u32,
    /// Tightly packed RGBA8 of `texture_width × texture_height`.
    pub rgba: Vec<u8>,
    /// The encoded bytes, kept so uploads can be shown again.
    pub source_bytes: Arc<[u8]>,
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("texture_width", &self.texture_width)
            .field("texture_height", &self.texture_height)
            .finish_non_exhaustive()
    }
}

impl DecodedImage {
    pub fn was_downscaled(&self) -> bool {
        self.texture_width != self.width || self.texture_height != self.height
    }
}

/// Result of a job, tagged with its ticket and purpose.
#[derive(Debug)]
pub struct DecodeOutcome {
    pub ticket: LoadTicket,
    pub purpose: DecodePurpose,
    pub label: String,
    pub result: Result<DecodedImage>,
}

/// Runs decode jobs and reports their outcomes.
pub trait DecodeBackend {
    /// Queue a job. Never blocks on the decode itself (except the immediate backend).
    fn submit(&mut self, job: DecodeJob);

    /// Drain finished outcomes, in completion order.
    fn poll(&mut self) -> Vec<DecodeOutcome>;
}

/// Decodes on the calling thread during `submit`.
///
/// Used by tests and as the fallback when no decoder thread can be spawned.
#[derive(Debug, Default)]
pub struct ImmediateDecoder {
    finished: Vec<DecodeOutcome>,
}

impl ImmediateDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DecodeBackend for ImmediateDecoder {
    fn submit(&mut self, job: DecodeJob) {
        self.finished.push(run_job_blocking(job));
    }

    fn poll(&mut self) -> Vec<DecodeOutcome> {
        std::mem::take(&mut self.finished)
    }
}

/// The platform's asynchronous backend.
#[cfg(not(target_arch = "wasm32"))]
pub fn default_backend() -> Box<dyn DecodeBackend> {
    match ThreadDecoder::spawn() {
        Ok(decoder) => Box::new(decoder),
        Err(e) => {
            log::warn!("Failed to spawn decoder thread, decoding inline: {}", e);
            Box::new(ImmediateDecoder::new())
        }
    }
}

/// The platform's asynchronous backend.
#[cfg(target_arch = "wasm32")]
pub fn default_backend() -> Box<dyn DecodeBackend> {
    Box::new(LocalDecoder::new())
}

/// Read and decode a job on the current thread.
pub fn run_job_blocking(job: DecodeJob) -> DecodeOutcome {
    let result = job
        .input
        .read_blocking(&job.label)
        .and_then(|bytes| decode_bytes(&job.label, bytes, job.max_dimension));
    finish(job, result)
}

pub(crate) fn finish(job: DecodeJob, result: Result<DecodedImage>) -> DecodeOutcome {
    match &result {
        Ok(image) => log::debug!(
            "Decoded {} (ticket {}): {}x{}",
            job.label,
            job.ticket.value(),
            image.width,
            image.height
        ),
        Err(e) => log::warn!("Decode of {} failed: {}", job.label, e),
    }
    DecodeOutcome {
        ticket: job.ticket,
        purpose: job.purpose,
        label: job.label,
        result,
    }
}

/// Decode encoded bytes to RGBA8, downscaling to fit `max_dimension`.
pub fn decode_bytes(label: &str, bytes: Arc<[u8]>, max_dimension: u32) -> Result<DecodedImage> {
    let decoded = image::load_from_memory(&bytes).map_err(|e| ViewerError::decode(label, e))?;
    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(ViewerError::decode(label, "image has no pixels"));
    }

    let mut rgba = decoded.to_rgba8();
    let (texture_width, texture_height) = fit_within(width, height, max_dimension);
    if (texture_width, texture_height) != (width, height) {
        log::info!(
            "Downscaling {} from {}x{} to {}x{} (max texture size {})",
            label,
            width,
            height,
            texture_width,
            texture_height,
            max_dimension
        );
        rgba = image::imageops::resize(&rgba, texture_width, texture_height, FilterType::Triangle);
    }

    Ok(DecodedImage {
        width,
        height,
        texture_width,
        texture_height,
        rgba: rgba.into_raw(),
        source_bytes: bytes,
    })
}

/// Largest size with the same aspect ratio whose edges fit `max_dimension`.
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let max_dimension = max_dimension.max(1);
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }
    let scale = max_dimension as f64 / width.max(height) as f64;
    let scaled = |v: u32| ((v as f64 * scale).round() as u32).clamp(1, max_dimension);
    (scaled(width), scaled(height))
}
