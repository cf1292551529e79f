//! An event source that never emits.
//!
//! Used where the host offers no interaction events at all (headless runs,
//! server-side replays) so sessions can still be started and snapshotted.

use crate::capture::hub::{CaptureError, EventSource, Subscription};
use crossbeam_channel::bounded;

/// A source with no events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSource;

impl EventSource for NoopSource {
    fn attach(&self) -> Result<Subscription, CaptureError> {
        let (sender, receiver) = bounded(1);
        // Keep the sender alive until detach so the subscription reads as connected.
        Ok(Subscription::new(receiver, Some(Box::new(move || drop(sender)))))
    }
}
