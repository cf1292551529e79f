//! In-process event source and subscription handling.
//!
//! Host glue pushes interaction events into an [`EventHub`] through
//! [`EventEmitter`]s. Each [`Subscription`] gets its own bounded queue and is
//! detached from its source when dropped.

use crate::capture::types::{CapturedEvent, InteractionEvent};
use crate::core::environment::SharedEnvironment;
use crate::transparency::SharedTransparencyLog;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::cell::Cell;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use thiserror::Error;

/// Errors that can occur while attaching to an event source.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Event source is closed")]
    SourceClosed,
}

/// Something a session can subscribe to for interaction events.
pub trait EventSource {
    /// Start receiving events. Events stop flowing once the returned
    /// subscription is dropped.
    fn attach(&self) -> Result<Subscription, CaptureError>;
}

/// A live attachment to an event source.
pub struct Subscription {
    receiver: Receiver<CapturedEvent>,
    disconnected: Cell<bool>,
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a receiver; `detach` runs exactly once when the subscription is dropped.
    pub fn new(receiver: Receiver<CapturedEvent>, detach: Option<Box<dyn FnOnce() + Send>>) -> Self {
        Self {
            receiver,
            disconnected: Cell::new(false),
            detach,
        }
    }

    /// Take the next queued event without blocking.
    ///
    /// `None` means nothing is queued or the source has gone away.
    pub fn try_next(&self) -> Option<CapturedEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.disconnected.set(true);
                None
            }
        }
    }

    /// Drop everything currently queued. Returns how many events were discarded.
    pub fn discard_pending(&self) -> usize {
        self.receiver.try_iter().count()
    }

    /// Number of events waiting to be taken.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Whether a read has found the source closed and drained.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.get()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("pending", &self.receiver.len())
            .finish()
    }
}

struct HubInner {
    subscribers: Mutex<Vec<(u64, Sender<CapturedEvent>)>>,
    next_id: AtomicU64,
    closed: AtomicBool,
    capacity: usize,
    environment: SharedEnvironment,
    transparency_log: Option<SharedTransparencyLog>,
}

impl HubInner {
    fn subscribers(&self) -> MutexGuard<'_, Vec<(u64, Sender<CapturedEvent>)>> {
        // A panicking emitter cannot leave the list half-updated, so keep going.
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, captured: CapturedEvent) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }

        let mut subscribers = self.subscribers();
        subscribers.retain(|(id, sender)| match sender.try_send(captured.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::debug!(subscriber = id, "Subscriber queue full, dropping event");
                if let Some(log) = &self.transparency_log {
                    log.record_dropped_event();
                }
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }
}

/// Fan-out hub for interaction events.
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<HubInner>,
}

impl EventHub {
    /// Create a hub whose subscribers each queue at most `capacity` events.
    pub fn new(environment: SharedEnvironment, capacity: usize) -> Self {
        Self::build(environment, capacity, None)
    }

    /// Create a hub that reports dropped events to a transparency log.
    pub fn with_transparency_log(
        environment: SharedEnvironment,
        capacity: usize,
        log: SharedTransparencyLog,
    ) -> Self {
        Self::build(environment, capacity, Some(log))
    }

    fn build(
        environment: SharedEnvironment,
        capacity: usize,
        transparency_log: Option<SharedTransparencyLog>,
    ) -> Self {
        Self {
            inner: Arc::new(HubInner {
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                capacity: capacity.max(1),
                environment,
                transparency_log,
            }),
        }
    }

    /// A handle host code uses to push events into the hub.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            inner: self.inner.clone(),
        }
    }

    /// Stamp `event` with the current time and deliver it to every subscriber.
    pub fn emit(&self, event: InteractionEvent) {
        self.emitter().emit(event);
    }

    /// Deliver `event` with an explicit capture instant.
    pub fn emit_at(&self, at_ms: f64, event: InteractionEvent) {
        self.emitter().emit_at(at_ms, event);
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }

    /// Stop delivering events and disconnect every subscriber.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.subscribers().clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

impl EventSource for EventHub {
    fn attach(&self) -> Result<Subscription, CaptureError> {
        if self.is_closed() {
            return Err(CaptureError::SourceClosed);
        }

        let (sender, receiver) = bounded(self.inner.capacity);
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner.subscribers().push((id, sender));
        tracing::debug!(subscriber = id, "Subscriber attached");

        let hub: Weak<HubInner> = Arc::downgrade(&self.inner);
        let detach = move || {
            if let Some(hub) = hub.upgrade() {
                hub.subscribers().retain(|(other, _)| *other != id);
                tracing::debug!(subscriber = id, "Subscriber detached");
            }
        };

        Ok(Subscription::new(receiver, Some(Box::new(detach))))
    }
}

/// Host-side handle for pushing events into a hub.
#[derive(Clone)]
pub struct EventEmitter {
    inner: Arc<HubInner>,
}

impl EventEmitter {
    /// Stamp `event` with the hub's clock and deliver it. Never blocks or fails.
    pub fn emit(&self, event: InteractionEvent) {
        let now = self.inner.environment.now_ms();
        self.emit_at(now, event);
    }

    /// Deliver `event` with an explicit capture instant.
    pub fn emit_at(&self, at_ms: f64, event: InteractionEvent) {
        self.inner.publish(CapturedEvent::new(at_ms, event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::environment::ManualEnvironment;
    use crate::transparency::TransparencyLog;

    fn hub(capacity: usize) -> (Arc<ManualEnvironment>, EventHub) {
        let env = Arc::new(ManualEnvironment::new());
        let hub = EventHub::new(env.clone(), capacity);
        (env, hub)
    }

    #[test]
    fn test_events_are_stamped_on_emit() {
        let (env, hub) = hub(16);
        let subscription = hub.attach().unwrap();

        env.set_ms(42.0);
        hub.emit(InteractionEvent::Click);

        let captured = subscription.try_next().unwrap();
        assert_eq!(captured, CapturedEvent::new(42.0, InteractionEvent::Click));
        assert!(subscription.try_next().is_none());
    }

    #[test]
    fn test_fan_out_to_every_subscriber() {
        let (_env, hub) = hub(16);
        let a = hub.attach().unwrap();
        let b = hub.attach().unwrap();

        hub.emit_at(1.0, InteractionEvent::Scroll);
        assert_eq!(a.pending(), 1);
        assert_eq!(b.pending(), 1);
    }

    #[test]
    fn test_discard_pending() {
        let (_env, hub) = hub(16);
        let subscription = hub.attach().unwrap();
        hub.emit_at(1.0, InteractionEvent::Click);
        hub.emit_at(2.0, InteractionEvent::Paste);

        assert_eq!(subscription.discard_pending(), 2);
        assert_eq!(subscription.pending(), 0);
        assert!(!subscription.is_disconnected());
    }

    #[test]
    fn test_drop_detaches() {
        let (_env, hub) = hub(16);
        let subscription = hub.attach().unwrap();
        assert_eq!(hub.subscriber_count(), 1);

        drop(subscription);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_full_queue_drops_events() {
        let env = Arc::new(ManualEnvironment::new());
        let log = Arc::new(TransparencyLog::new());
        let hub = EventHub::with_transparency_log(env, 2, log.clone());
        let subscription = hub.attach().unwrap();

        for i in 0..5 {
            hub.emit_at(i as f64, InteractionEvent::Click);
        }

        assert_eq!(subscription.pending(), 2);
        assert_eq!(log.stats().dropped_events, 3);
    }

    #[test]
    fn test_closed_hub_rejects_attach() {
        let (_env, hub) = hub(16);
        let subscription = hub.attach().unwrap();
        hub.close();

        assert!(matches!(hub.attach(), Err(CaptureError::SourceClosed)));
        assert!(subscription.try_next().is_none());
        assert!(subscription.is_disconnected());
        // Emitting after close is a silent no-op
        hub.emit(InteractionEvent::Paste);
    }
}
