/*
[INPUT]:  Lifecycle transitions from the client and subscriber callbacks
[OUTPUT]: Synchronous event delivery with isolated subscriber failures
[POS]:    Events layer - per-client subscription registry
[UPDATE]: When adding event kinds or changing delivery semantics
*/

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::types::{PaymentResponse, PiUser};

/// SDK lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZaplinkEvent {
    AuthSuccess,
    AuthError,
    AuthLogout,
    PaymentCreated,
    PaymentCompleted,
    PaymentFailed,
    PaymentCancelled,
    UserUpdated,
    Error,
}

impl fmt::Display for ZaplinkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ZaplinkEvent::AuthSuccess => "auth:success",
            ZaplinkEvent::AuthError => "auth:error",
            ZaplinkEvent::AuthLogout => "auth:logout",
            ZaplinkEvent::PaymentCreated => "payment:created",
            ZaplinkEvent::PaymentCompleted => "payment:completed",
            ZaplinkEvent::PaymentFailed => "payment:failed",
            ZaplinkEvent::PaymentCancelled => "payment:cancelled",
            ZaplinkEvent::UserUpdated => "user:updated",
            ZaplinkEvent::Error => "error",
        };
        write!(f, "{name}")
    }
}

/// Payload delivered with an event
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    /// Success and update events carry the user
    User(PiUser),
    /// Payment creation carries the payment response
    Payment(PaymentResponse),
    /// Error events carry the error message
    Error(String),
    /// Logout carries nothing
    None,
}

type EventCallback = dyn Fn(&EventData) + Send + Sync;

struct Registry {
    listeners: Mutex<HashMap<ZaplinkEvent, Vec<(u64, Arc<EventCallback>)>>>,
    next_id: AtomicU64,
}

/// Per-client event subscription registry
///
/// Delivery is synchronous, in registration order. A panicking subscriber
/// is isolated and logged; remaining subscribers still receive the event.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Registry>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Registry {
                listeners: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Register a callback for one event kind
    ///
    /// Returns a [`Subscription`] that removes exactly this registration,
    /// either explicitly or when dropped.
    pub fn on(
        &self,
        event: ZaplinkEvent,
        callback: impl Fn(&EventData) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap()
            .entry(event)
            .or_default()
            .push((id, Arc::new(callback)));

        Subscription {
            registry: Arc::downgrade(&self.inner),
            event,
            id,
            active: true,
        }
    }

    /// Deliver an event to all current subscribers
    pub fn emit(&self, event: ZaplinkEvent, data: &EventData) {
        let callbacks: Vec<Arc<EventCallback>> = {
            let listeners = self.inner.listeners.lock().unwrap();
            listeners
                .get(&event)
                .map(|entries| entries.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                .unwrap_or_default()
        };

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(data))).is_err() {
                tracing::error!("subscriber for {event} panicked; continuing delivery");
            }
        }
    }

    /// Number of active subscriptions for one event kind
    pub fn subscriber_count(&self, event: ZaplinkEvent) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap()
            .get(&event)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle that removes one registration when dropped or unsubscribed
pub struct Subscription {
    registry: Weak<Registry>,
    event: ZaplinkEvent,
    id: u64,
    active: bool,
}

impl Subscription {
    /// Remove this registration now
    pub fn unsubscribe(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        if let Some(registry) = self.registry.upgrade() {
            let mut listeners = registry.listeners.lock().unwrap();
            if let Some(entries) = listeners.get_mut(&self.event) {
                entries.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_on_emit_and_unsubscribe() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        let subscription = bus.on(ZaplinkEvent::AuthLogout, move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(ZaplinkEvent::AuthLogout, &EventData::None);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Other event kinds do not reach this subscriber.
        bus.emit(ZaplinkEvent::AuthError, &EventData::Error("boom".to_string()));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        subscription.unsubscribe();
        bus.emit(ZaplinkEvent::AuthLogout, &EventData::None);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(ZaplinkEvent::AuthLogout), 0);
    }

    #[test]
    fn test_drop_unsubscribes_exactly_one_handle() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let first = {
            let hits = Arc::clone(&hits);
            bus.on(ZaplinkEvent::UserUpdated, move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };
        let _second = {
            let hits = Arc::clone(&hits);
            bus.on(ZaplinkEvent::UserUpdated, move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };

        drop(first);
        assert_eq!(bus.subscriber_count(ZaplinkEvent::UserUpdated), 1);

        bus.emit(
            ZaplinkEvent::UserUpdated,
            &EventData::Error("unused".to_string()),
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_subscriber_does_not_abort_delivery() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let _panicker = bus.on(ZaplinkEvent::PaymentCreated, |_| {
            panic!("subscriber exploded");
        });
        let hits_clone = Arc::clone(&hits);
        let _counter = bus.on(ZaplinkEvent::PaymentCreated, move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(ZaplinkEvent::PaymentCreated, &EventData::None);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(ZaplinkEvent::AuthSuccess.to_string(), "auth:success");
        assert_eq!(ZaplinkEvent::PaymentFailed.to_string(), "payment:failed");
        assert_eq!(ZaplinkEvent::UserUpdated.to_string(), "user:updated");
        assert_eq!(ZaplinkEvent::Error.to_string(), "error");
    }
}
