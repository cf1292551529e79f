//! Event capture input side.
//!
//! This module defines the interaction events the host delivers, the
//! subscription capability a session holds while capturing, and the
//! in-process hub host glue pushes events into.

pub mod hub;
pub mod noop;
pub mod types;

// Re-export commonly used types
pub use hub::{CaptureError, EventEmitter, EventHub, EventSource, Subscription};
pub use noop::NoopSource;
pub use types::{CapturedEvent, EventKind, InteractionEvent, MouseSample};
