//! Capture audit counters.
//!
//! Tracks how much was captured without keeping any of the captured data.
//! Counters live in memory only and are never written to disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::capture::types::{EventKind, InteractionEvent};

/// Audit counters for the running process.
#[derive(Debug)]
pub struct TransparencyLog {
    pointer_events: AtomicU64,
    keyboard_events: AtomicU64,
    other_events: AtomicU64,
    /// Events missing a field their handler reads
    malformed_events: AtomicU64,
    /// Events dropped because a subscriber queue was full
    dropped_events: AtomicU64,
    sessions_started: AtomicU64,
    snapshots_taken: AtomicU64,
    created_at: DateTime<Utc>,
}

impl TransparencyLog {
    pub fn new() -> Self {
        Self {
            pointer_events: AtomicU64::new(0),
            keyboard_events: AtomicU64::new(0),
            other_events: AtomicU64::new(0),
            malformed_events: AtomicU64::new(0),
            dropped_events: AtomicU64::new(0),
            sessions_started: AtomicU64::new(0),
            snapshots_taken: AtomicU64::new(0),
            created_at: Utc::now(),
        }
    }

    /// Record an applied event.
    pub fn record_event(&self, event: &InteractionEvent) {
        let counter = match event.kind() {
            EventKind::Pointer => &self.pointer_events,
            EventKind::Keyboard => &self.keyboard_events,
            _ => &self.other_events,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if event.is_malformed() {
            self.malformed_events.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_dropped_event(&self) {
        self.dropped_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot_taken(&self) {
        self.snapshots_taken.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            pointer_events: self.pointer_events.load(Ordering::Relaxed),
            keyboard_events: self.keyboard_events.load(Ordering::Relaxed),
            other_events: self.other_events.load(Ordering::Relaxed),
            malformed_events: self.malformed_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_events.load(Ordering::Relaxed),
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            snapshots_taken: self.snapshots_taken.load(Ordering::Relaxed),
            created_at: self.created_at,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Capture Statistics:\n\
             - Pointer events: {}\n\
             - Keyboard events: {}\n\
             - Other events: {}\n\
             - Malformed events: {}\n\
             - Dropped events: {}\n\
             - Sessions started: {}\n\
             - Snapshots taken: {}\n\
             \n\
             Retention:\n\
             - Raw telemetry is held in memory for the current session only\n\
             - No key content captured beyond the delete key",
            stats.pointer_events,
            stats.keyboard_events,
            stats.other_events,
            stats.malformed_events,
            stats.dropped_events,
            stats.sessions_started,
            stats.snapshots_taken
        )
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for counter in [
            &self.pointer_events,
            &self.keyboard_events,
            &self.other_events,
            &self.malformed_events,
            &self.dropped_events,
            &self.sessions_started,
            &self.snapshots_taken,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the audit counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub pointer_events: u64,
    pub keyboard_events: u64,
    pub other_events: u64,
    pub malformed_events: u64,
    pub dropped_events: u64,
    pub sessions_started: u64,
    pub snapshots_taken: u64,
    pub created_at: DateTime<Utc>,
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

/// Create a new shared transparency log.
pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}
