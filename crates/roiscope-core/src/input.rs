//! Pointer input for the region editor, in surface coordinates.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Double-click detection constants.
const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(500);
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Primary-button pointer events delivered by the host surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    DoubleClick(Point),
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down(p) | PointerEvent::Move(p) | PointerEvent::Up(p) | PointerEvent::DoubleClick(p) => p,
        }
    }
}

/// Synthesizes double-clicks for hosts that only report presses.
#[derive(Debug, Clone, Default)]
pub struct ClickTracker {
    last_click: Option<(Instant, Point)>,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press at `now`. Returns true when it completes a double-click.
    pub fn press_at(&mut self, position: Point, now: Instant) -> bool {
        if let Some((last_time, last_pos)) = self.last_click {
            let elapsed = now.saturating_duration_since(last_time);
            if elapsed < DOUBLE_CLICK_TIME && position.distance(last_pos) < DOUBLE_CLICK_DISTANCE {
                // Reset so a third press starts a new pair
                self.last_click = None;
                return true;
            }
        }
        self.last_click = Some((now, position));
        false
    }

    /// Expand a raw event: a press completing a double-click is followed by
    /// a [`PointerEvent::DoubleClick`] at the same spot.
    pub fn expand_at(&mut self, event: PointerEvent, now: Instant) -> Vec<PointerEvent> {
        match event {
            PointerEvent::Down(p) if self.press_at(p, now) => vec![event, PointerEvent::DoubleClick(p)],
            _ => vec![event],
        }
    }

    pub fn expand(&mut self, event: PointerEvent) -> Vec<PointerEvent> {
        self.expand_at(event, Instant::now())
    }
}
