//! Per-channel capture buffers and the event handlers that fill them.

use crate::capture::types::{InteractionEvent, MouseSample};
use crate::core::clock::ActivityClock;

/// Raw telemetry accumulated over one session.
///
/// Buffers are append-only between resets; samples keep arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureBuffers {
    pub mouse_moves: Vec<MouseSample>,
    pub key_times: Vec<f64>,
    pub backspace_count: u32,
    pub click_count: u32,
    pub scroll_count: u32,
    pub focus_changes: u32,
    /// Sticky for the rest of the session once set
    pub paste_detected: bool,
}

impl CaptureBuffers {
    /// Clear every buffer, counter and flag.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Applies interaction events to the clock and buffers.
#[derive(Debug, Clone)]
pub struct EventCapture {
    backspace_key: String,
}

impl EventCapture {
    pub fn new(backspace_key: impl Into<String>) -> Self {
        Self {
            backspace_key: backspace_key.into(),
        }
    }

    /// Apply one event captured at `now`.
    ///
    /// Missing or non-finite coordinates are stored as zero, a missing key
    /// name is a plain keystroke.
    pub fn apply(
        &self,
        clock: &mut ActivityClock,
        buffers: &mut CaptureBuffers,
        event: &InteractionEvent,
        now: f64,
    ) {
        clock.record_action(now);

        match event {
            InteractionEvent::PointerMove { x, y } => {
                clock.record_mouse_move(now);
                buffers
                    .mouse_moves
                    .push(MouseSample::new(coordinate(*x), coordinate(*y), now));
            }
            InteractionEvent::KeyDown { key } => {
                buffers.key_times.push(now);
                if key.as_deref() == Some(self.backspace_key.as_str()) {
                    buffers.backspace_count += 1;
                }
            }
            InteractionEvent::FocusIn => buffers.focus_changes += 1,
            InteractionEvent::Click => buffers.click_count += 1,
            InteractionEvent::Scroll => buffers.scroll_count += 1,
            InteractionEvent::Paste => buffers.paste_detected = true,
        }
    }
}

impl Default for EventCapture {
    fn default() -> Self {
        Self::new("Backspace")
    }
}

fn coordinate(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}
