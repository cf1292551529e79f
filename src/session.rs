//! Capture session lifecycle.
//!
//! A [`BehaviorSession`] owns everything captured during one login attempt:
//! the activity clock, the capture buffers and the subscription to the
//! host's event source. Sessions are independent; nothing is global.

use crate::capture::hub::{CaptureError, EventSource, Subscription};
use crate::capture::types::{CapturedEvent, InteractionEvent};
use crate::config::Config;
use crate::core::buffers::{CaptureBuffers, EventCapture};
use crate::core::clock::ActivityClock;
use crate::core::environment::SharedEnvironment;
use crate::core::snapshot::{FeatureVector, SnapshotAssembler};
use crate::transparency::SharedTransparencyLog;
use uuid::Uuid;

/// Telemetry capture for one login attempt.
pub struct BehaviorSession {
    id: Option<Uuid>,
    clock: ActivityClock,
    buffers: CaptureBuffers,
    capture: EventCapture,
    environment: SharedEnvironment,
    subscription: Option<Subscription>,
    transparency_log: Option<SharedTransparencyLog>,
}

impl BehaviorSession {
    /// Create a session that has not started yet.
    pub fn new(config: &Config, environment: SharedEnvironment) -> Self {
        let thresholds = config.thresholds;
        Self {
            id: None,
            clock: ActivityClock::new(thresholds.idle_threshold_ms, thresholds.pause_threshold_ms),
            buffers: CaptureBuffers::default(),
            capture: EventCapture::new(config.backspace_key.clone()),
            environment,
            subscription: None,
            transparency_log: None,
        }
    }

    /// Report applied events and session starts to a transparency log.
    pub fn with_transparency_log(mut self, log: SharedTransparencyLog) -> Self {
        self.transparency_log = Some(log);
        self
    }

    /// Discard all captured state and start a new session now.
    ///
    /// An existing subscription stays attached, but anything it queued before
    /// the restart is discarded. Use [`start_with`](Self::start_with) to
    /// resubscribe.
    pub fn start(&mut self) {
        if let Some(subscription) = &self.subscription {
            let stale = subscription.discard_pending();
            if stale > 0 {
                tracing::debug!(stale, "Discarded events queued before restart");
            }
        }

        let now = self.environment.now_ms();
        self.buffers.reset();
        self.clock.start(now);

        let id = Uuid::new_v4();
        self.id = Some(id);
        if let Some(log) = &self.transparency_log {
            log.record_session_started();
        }
        tracing::debug!(session_id = %id, start_ms = now, "Session started");
    }

    /// Start a new session and subscribe to `source`.
    ///
    /// Any previous subscription is released first, together with events it
    /// still had queued. If attaching fails the session is still started,
    /// just without a subscription.
    pub fn start_with(&mut self, source: &dyn EventSource) -> Result<(), CaptureError> {
        self.subscription = None;
        self.start();
        self.subscription = Some(source.attach()?);
        Ok(())
    }

    /// Release the event subscription. Captured state stays readable.
    pub fn dispose(&mut self) {
        if self.subscription.take().is_some() {
            tracing::debug!(session_id = ?self.id, "Session unsubscribed");
        }
    }

    pub fn is_started(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Identifier of the current session, for log correlation.
    pub fn session_id(&self) -> Option<Uuid> {
        self.id
    }

    /// Apply an event captured right now.
    pub fn record(&mut self, event: &InteractionEvent) {
        let now = self.environment.now_ms();
        self.record_at(event, now);
    }

    /// Apply an event captured at `at_ms`.
    ///
    /// Ignored before the first start, and when stamped earlier than the
    /// current session's start.
    pub fn record_at(&mut self, event: &InteractionEvent, at_ms: f64) {
        match self.clock.start_time {
            None => {
                tracing::trace!(?event, "Ignoring event recorded before session start");
                return;
            }
            Some(start_ms) if at_ms < start_ms => {
                tracing::trace!(
                    ?event,
                    at_ms,
                    start_ms,
                    "Ignoring event stamped before session start"
                );
                return;
            }
            Some(_) => {}
        }

        self.capture
            .apply(&mut self.clock, &mut self.buffers, event, at_ms);
        if let Some(log) = &self.transparency_log {
            log.record_event(event);
        }
        tracing::trace!(kind = ?event.kind(), at_ms, "Event captured");
    }

    /// Apply a timestamped event.
    pub fn apply(&mut self, captured: &CapturedEvent) {
        self.record_at(&captured.event, captured.at_ms);
    }

    /// Apply every event queued on the subscription, in arrival order.
    ///
    /// The subscription is released once its source has closed. Returns the
    /// number of events applied.
    pub fn pump(&mut self) -> usize {
        let Some(subscription) = self.subscription.take() else {
            return 0;
        };

        let mut applied = 0;
        // One read past the queued count, so a closed source is noticed.
        for _ in 0..=subscription.pending() {
            match subscription.try_next() {
                Some(captured) => {
                    self.apply(&captured);
                    applied += 1;
                }
                None => break,
            }
        }

        if subscription.is_disconnected() {
            tracing::debug!(session_id = ?self.id, "Event source closed, releasing subscription");
        } else {
            self.subscription = Some(subscription);
        }
        applied
    }

    /// Reduce the current state to a feature vector.
    ///
    /// Session state is left untouched; only the transparency log counts it.
    pub fn snapshot(&self) -> FeatureVector {
        if let Some(log) = &self.transparency_log {
            log.record_snapshot_taken();
        }
        SnapshotAssembler::assemble(&self.clock, &self.buffers, self.environment.as_ref())
    }

    /// Read-only view of the activity clock.
    pub fn clock(&self) -> &ActivityClock {
        &self.clock
    }

    /// Read-only view of the capture buffers.
    pub fn buffers(&self) -> &CaptureBuffers {
        &self.buffers
    }
}

impl std::fmt::Debug for BehaviorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorSession")
            .field("id", &self.id)
            .field("clock", &self.clock)
            .field("subscribed", &self.subscription.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::hub::EventHub;
    use crate::capture::noop::NoopSource;
    use crate::core::environment::ManualEnvironment;
    use crate::transparency::TransparencyLog;
    use std::sync::Arc;

    fn session() -> (Arc<ManualEnvironment>, BehaviorSession) {
        let env = Arc::new(ManualEnvironment::new());
        let session = BehaviorSession::new(&Config::default(), env.clone());
        (env, session)
    }

    #[test]
    fn test_events_before_start_are_ignored() {
        let (_env, mut session) = session();
        session.record_at(&InteractionEvent::Click, 10.0);

        assert!(!session.is_started());
        assert_eq!(session.buffers(), &CaptureBuffers::default());
    }

    #[test]
    fn test_start_assigns_new_id() {
        let (_env, mut session) = session();
        session.start();
        let first = session.session_id();
        session.start();

        assert!(first.is_some());
        assert_ne!(first, session.session_id());
    }

    #[test]
    fn test_pump_applies_queued_events() {
        let (env, mut session) = session();
        let hub = EventHub::new(env.clone(), 64);
        session.start_with(&hub).unwrap();

        env.set_ms(100.0);
        hub.emit(InteractionEvent::key_down("a"));
        env.set_ms(200.0);
        hub.emit(InteractionEvent::key_down("Backspace"));

        assert_eq!(session.pump(), 2);
        assert_eq!(session.buffers().key_times, vec![100.0, 200.0]);
        assert_eq!(session.pump(), 0);
    }

    #[test]
    fn test_restart_releases_previous_subscription() {
        let (env, mut session) = session();
        let hub = EventHub::new(env, 64);
        session.start_with(&hub).unwrap();
        hub.emit_at(5.0, InteractionEvent::Click);

        session.start_with(&hub).unwrap();
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(session.pump(), 0);
    }

    #[test]
    fn test_dispose_keeps_state_readable() {
        let (env, mut session) = session();
        let hub = EventHub::new(env.clone(), 64);
        session.start_with(&hub).unwrap();
        hub.emit_at(1.0, InteractionEvent::Click);
        session.pump();

        session.dispose();
        assert!(!session.is_subscribed());
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(session.snapshot().interaction.click_count, 1);
    }

    #[test]
    fn test_closed_source_still_starts_session() {
        let (env, mut session) = session();
        let hub = EventHub::new(env, 64);
        hub.close();

        assert!(session.start_with(&hub).is_err());
        assert!(session.is_started());
        assert!(!session.is_subscribed());
    }

    #[test]
    fn test_transparency_log_counts() {
        let (_env, session) = session();
        let log = Arc::new(TransparencyLog::new());
        let mut session = session.with_transparency_log(log.clone());

        session.start_with(&NoopSource).unwrap();
        session.record(&InteractionEvent::pointer_move(1.0, 1.0));
        session.record(&InteractionEvent::Paste);
        session.snapshot();
        session.snapshot();

        let stats = log.stats();
        assert_eq!(stats.sessions_started, 1);
        assert_eq!(stats.pointer_events, 1);
        assert_eq!(stats.other_events, 1);
        assert_eq!(stats.snapshots_taken, 2);
    }

    #[test]
    fn test_events_stamped_before_start_are_ignored() {
        let (env, mut session) = session();
        env.set_ms(1000.0);
        session.start();

        session.record_at(&InteractionEvent::key_down("a"), 400.0);
        session.record_at(&InteractionEvent::key_down("b"), 1200.0);

        assert_eq!(session.buffers().key_times, vec![1200.0]);
        assert_eq!(session.clock().time_to_first_action_ms(), 200.0);
    }

    #[test]
    fn test_pump_releases_closed_source() {
        let (env, mut session) = session();
        let hub = EventHub::new(env, 64);
        session.start_with(&hub).unwrap();
        hub.emit_at(1.0, InteractionEvent::Scroll);
        session.pump();
        assert!(session.is_subscribed());

        hub.close();
        assert_eq!(session.pump(), 0);
        assert!(!session.is_subscribed());
        assert_eq!(session.snapshot().interaction.scroll_count, 1);
    }
}
