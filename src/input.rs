//! Pointer, touch and wheel tracking.
//!
//! Raw events are reduced to [`Gesture`]s in logical pixels; the viewer turns
//! gestures into orientation changes.

use std::collections::BTreeMap;

use web_time::{Duration, Instant};
use winit::event::{MouseScrollDelta, TouchPhase};

use crate::constants::{DRAG_RELEASE_GRACE_MS, PIXELS_PER_WHEEL_LINE};

/// A reduced input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// A drag started (mouse press or first finger down).
    Press,
    /// Pointer moved while dragging, in logical pixels.
    Drag { dx: f32, dy: f32 },
    /// Finger distance changed by `change` logical pixels; positive spreads.
    Pinch { change: f32 },
    /// Wheel scrolled; positive `delta_y` scrolls down (zooms out).
    Wheel { delta_y: f32 },
    /// The last pointer was released.
    Release,
}

/// Drag flag with a grace period after release.
#[derive(Debug, Clone, Copy)]
pub struct DragState {
    active: bool,
    released_at: Option<Instant>,
    grace: Duration,
}

impl Default for DragState {
    fn default() -> Self {
        Self::new(Duration::from_millis(DRAG_RELEASE_GRACE_MS))
    }
}

impl DragState {
    pub fn new(grace: Duration) -> Self {
        Self {
            active: false,
            released_at: None,
            grace,
        }
    }

    pub fn press(&mut self) {
        self.active = true;
        self.released_at = None;
    }

    pub fn release(&mut self, now: Instant) {
        if self.active {
            self.active = false;
            self.released_at = Some(now);
        }
    }

    /// Whether a drag is in progress or was released less than the grace period ago.
    pub fn is_dragging(&self, now: Instant) -> bool {
        self.active
            || self
                .released_at
                .is_some_and(|at| now.saturating_duration_since(at) < self.grace)
    }
}

/// Tracks mouse buttons and touch points between events.
#[derive(Debug, Default)]
pub struct PointerTracker {
    mouse_down: bool,
    cursor: Option<(f32, f32)>,
    touches: BTreeMap<u64, (f32, f32)>,
    pinch_distance: Option<f32>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mouse_pressed(&mut self) -> Option<Gesture> {
        if self.mouse_down {
            return None;
        }
        self.mouse_down = true;
        Some(Gesture::Press)
    }

    pub fn mouse_released(&mut self) -> Option<Gesture> {
        if !self.mouse_down {
            return None;
        }
        self.mouse_down = false;
        self.touches.is_empty().then_some(Gesture::Release)
    }

    /// Cursor moved to `(x, y)`; yields a drag delta while the button is held.
    pub fn cursor_moved(&mut self, x: f32, y: f32) -> Option<Gesture> {
        let previous = self.cursor.replace((x, y));
        if !self.mouse_down {
            return None;
        }
        let (px, py) = previous?;
        Some(Gesture::Drag {
            dx: x - px,
            dy: y - py,
        })
    }

    pub fn cursor_left(&mut self) {
        self.cursor = None;
    }

    /// One touch event. A single finger drags, two fingers pinch.
    pub fn touch(&mut self, id: u64, phase: TouchPhase, x: f32, y: f32) -> Option<Gesture> {
        match phase {
            TouchPhase::Started => {
                let first = self.touches.is_empty() && !self.mouse_down;
                self.touches.insert(id, (x, y));
                self.pinch_distance = self.finger_distance();
                first.then_some(Gesture::Press)
            }
            TouchPhase::Moved => {
                let previous = self.touches.insert(id, (x, y))?;
                if self.touches.len() >= 2 {
                    let distance = self.finger_distance()?;
                    let change = distance - self.pinch_distance.replace(distance)?;
                    Some(Gesture::Pinch { change })
                } else {
                    Some(Gesture::Drag {
                        dx: x - previous.0,
                        dy: y - previous.1,
                    })
                }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.touches.remove(&id)?;
                self.pinch_distance = self.finger_distance();
                (self.touches.is_empty() && !self.mouse_down).then_some(Gesture::Release)
            }
        }
    }

    /// Distance between the two lowest-id fingers.
    fn finger_distance(&self) -> Option<f32> {
        let mut points = self.touches.values();
        let (ax, ay) = points.next()?;
        let (bx, by) = points.next()?;
        Some(((ax - bx).powi(2) + (ay - by).powi(2)).sqrt())
    }

    pub fn is_pressed(&self) -> bool {
        self.mouse_down || !self.touches.is_empty()
    }
}

/// Browser-style `deltaY` for a wheel event, in logical pixels.
pub fn wheel_delta_y(delta: MouseScrollDelta, scale_factor: f64) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * PIXELS_PER_WHEEL_LINE,
        MouseScrollDelta::PixelDelta(position) => (-position.y / scale_factor.max(f64::EPSILON)) as f32,
    }
}
