//! Frame loop with cancellation.
//!
//! The loop does not own a clock: the winit runtime feeds it one tick per
//! `RedrawRequested`, and headless callers drive it from any [`FrameSource`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use web_time::Instant;

/// Shared stop flag for the render loop.
pub type CancellationToken = Arc<AtomicBool>;

pub fn new_token() -> CancellationToken {
    Arc::new(AtomicBool::new(false))
}

pub fn cancel(token: &CancellationToken) {
    token.store(true, Ordering::Relaxed);
}

pub fn is_cancelled(token: &CancellationToken) -> bool {
    token.load(Ordering::Relaxed)
}

/// Supplies frame timestamps, blocking until the next frame is due.
pub trait FrameSource {
    /// `None` when the source is exhausted.
    fn next_frame(&mut self) -> Option<Instant>;
}

/// Counts frames and stops once its token is cancelled.
#[derive(Debug)]
pub struct RenderLoop {
    token: CancellationToken,
    frames: u64,
}

impl RenderLoop {
    pub fn new(token: CancellationToken) -> Self {
        Self { token, frames: 0 }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_running(&self) -> bool {
        !is_cancelled(&self.token)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one frame unless cancelled. Returns whether the loop should continue.
    pub fn tick(&mut self, now: Instant, on_frame: impl FnOnce(Instant)) -> bool {
        if !self.is_running() {
            return false;
        }
        on_frame(now);
        self.frames += 1;
        self.is_running()
    }

    /// Drive frames from `source` until cancelled or the source ends.
    /// Returns the number of frames run by this call.
    pub fn run_until_cancelled<S: FrameSource>(
        &mut self,
        source: &mut S,
        mut on_frame: impl FnMut(Instant),
    ) -> u64 {
        let start = self.frames;
        while self.is_running() {
            let Some(now) = source.next_frame() else {
                break;
            };
            if !self.tick(now, &mut on_frame) {
                break;
            }
        }
        log::debug!("Render loop stopped after {} frames", self.frames - start);
        self.frames - start
    }
}

/// Fixed-interval frame source for headless runs.
#[derive(Debug, Clone)]
pub struct FixedStepFrames {
    next: Instant,
    step: web_time::Duration,
    remaining: Option<u64>,
}

impl FixedStepFrames {
    pub fn new(start: Instant, step: web_time::Duration) -> Self {
        Self {
            next: start,
            step,
            remaining: None,
        }
    }

    /// Stop after `count` frames.
    pub fn limited(mut self, count: u64) -> Self {
        self.remaining = Some(count);
        self
    }
}

impl FrameSource for FixedStepFrames {
    fn next_frame(&mut self) -> Option<Instant> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        let now = self.next;
        self.next += self.step;
        Some(now)
    }
}
