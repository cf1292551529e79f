//! Interaction event types delivered by the host.
//!
//! Payloads are deliberately lenient: any field may be missing, and handlers
//! treat a missing field as zero (coordinates) or as "not the delete key".

use serde::{Deserialize, Serialize};

/// A single interaction event as delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionEvent {
    /// Pointer movement with viewport-relative coordinates
    PointerMove {
        #[serde(default)]
        x: Option<f64>,
        #[serde(default)]
        y: Option<f64>,
    },
    /// Key press; `key` is the host's logical key name
    KeyDown {
        #[serde(default)]
        key: Option<String>,
    },
    /// An element gained focus
    FocusIn,
    /// Pointer click
    Click,
    /// Scroll of the page or any element
    Scroll,
    /// Clipboard paste into the form
    Paste,
}

impl InteractionEvent {
    /// Pointer movement at the given coordinates.
    pub fn pointer_move(x: f64, y: f64) -> Self {
        InteractionEvent::PointerMove {
            x: Some(x),
            y: Some(y),
        }
    }

    /// Key press of the named key.
    pub fn key_down(key: impl Into<String>) -> Self {
        InteractionEvent::KeyDown {
            key: Some(key.into()),
        }
    }

    /// Channel name used in logs and audit counters.
    pub fn kind(&self) -> EventKind {
        match self {
            InteractionEvent::PointerMove { .. } => EventKind::Pointer,
            InteractionEvent::KeyDown { .. } => EventKind::Keyboard,
            InteractionEvent::FocusIn => EventKind::Focus,
            InteractionEvent::Click => EventKind::Click,
            InteractionEvent::Scroll => EventKind::Scroll,
            InteractionEvent::Paste => EventKind::Paste,
        }
    }

    /// Whether the payload lacks a field its handler reads.
    ///
    /// Malformed events are still applied; this only feeds the audit counters.
    pub fn is_malformed(&self) -> bool {
        match self {
            InteractionEvent::PointerMove { x, y } => {
                !matches!(x, Some(v) if v.is_finite()) || !matches!(y, Some(v) if v.is_finite())
            }
            InteractionEvent::KeyDown { key } => key.is_none(),
            _ => false,
        }
    }
}

/// Coarse event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Pointer,
    Keyboard,
    Focus,
    Click,
    Scroll,
    Paste,
}

/// An event stamped with its capture instant (monotonic milliseconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedEvent {
    /// Capture instant on the session's monotonic clock
    #[serde(rename = "t")]
    pub at_ms: f64,
    /// The event itself
    pub event: InteractionEvent,
}

impl CapturedEvent {
    pub fn new(at_ms: f64, event: InteractionEvent) -> Self {
        Self { at_ms, event }
    }
}

/// One buffered pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseSample {
    pub x: f64,
    pub y: f64,
    /// Capture instant in monotonic milliseconds
    pub t: f64,
}

impl MouseSample {
    pub fn new(x: f64, y: f64, t: f64) -> Self {
        Self { x, y, t }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event: InteractionEvent =
            serde_json::from_str(r#"{"type":"pointer_move","x":12.5,"y":3}"#).unwrap();
        assert_eq!(event, InteractionEvent::pointer_move(12.5, 3.0));

        let event: InteractionEvent = serde_json::from_str(r#"{"type":"paste"}"#).unwrap();
        assert_eq!(event, InteractionEvent::Paste);
    }

    #[test]
    fn test_missing_fields_are_tolerated() {
        let event: InteractionEvent = serde_json::from_str(r#"{"type":"pointer_move"}"#).unwrap();
        assert_eq!(event, InteractionEvent::PointerMove { x: None, y: None });
        assert!(event.is_malformed());

        let event: InteractionEvent = serde_json::from_str(r#"{"type":"key_down"}"#).unwrap();
        assert!(event.is_malformed());
        assert_eq!(event.kind(), EventKind::Keyboard);
    }

    #[test]
    fn test_non_finite_coordinates_are_malformed() {
        let event = InteractionEvent::PointerMove {
            x: Some(f64::NAN),
            y: Some(1.0),
        };
        assert!(event.is_malformed());
        assert!(!InteractionEvent::pointer_move(1.0, 2.0).is_malformed());
    }

    #[test]
    fn test_captured_event_record() {
        let record: CapturedEvent =
            serde_json::from_str(r#"{"t":150.0,"event":{"type":"key_down","key":"a"}}"#).unwrap();
        assert_eq!(record.at_ms, 150.0);
        assert_eq!(record.event, InteractionEvent::key_down("a"));
    }
}
