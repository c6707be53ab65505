//! In-process UI event bus.
//!
//! A synchronous publish/subscribe channel keyed by event name. Non-UI code
//! (the HTTP client) publishes on it; renderers such as [`ToastCenter`]
//! subscribe. There is no global instance: construct one [`EventBus`], wrap it
//! in an `Arc`, and hand it to every component that needs it.
//!
//! ## Delivery rules
//!
//! - Callbacks run on the publishing thread, in registration order.
//! - A callback is registered at most once per event; identity is the `Arc`.
//! - A callback removed by an earlier subscriber of the same publish is
//!   skipped. Removal from another thread may race with a delivery that has
//!   already started.
//! - A panicking callback is not isolated; it unwinds out of [`EventBus::publish`]
//!   and later subscribers miss the event.
//! - Events with no subscribers are dropped.
//!
//! [`ToastCenter`]: crate::toast::ToastCenter

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use tracing::trace;

use crate::types::ToastRequest;

/// Channel carrying [`ToastRequest`] payloads.
pub const TOAST_EVENT: &str = "toast";

/// Channel asking the front-end to show the sign-in modal. No payload.
pub const OPEN_AUTH_MODAL_EVENT: &str = "open-auth-modal";

/// Subscriber callback.
pub type Callback = Arc<dyn Fn(&EventPayload) + Send + Sync>;

/// Data passed unchanged from the publisher to every subscriber.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EventPayload {
    #[default]
    Empty,
    Toast(ToastRequest),
    Json(serde_json::Value),
}

impl From<ToastRequest> for EventPayload {
    fn from(request: ToastRequest) -> Self {
        Self::Toast(request)
    }
}

impl From<serde_json::Value> for EventPayload {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// Publish/subscribe registry keyed by event name.
#[derive(Default)]
pub struct EventBus {
    channels: RwLock<HashMap<String, Vec<Callback>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `event`.
    ///
    /// Registering the same `Arc` twice is a no-op; the returned handle still
    /// removes the single registration.
    pub fn subscribe(self: &Arc<Self>, event: &str, callback: Callback) -> Subscription {
        {
            let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
            let subscribers = channels.entry(event.to_string()).or_default();
            if !subscribers.iter().any(|existing| Arc::ptr_eq(existing, &callback)) {
                subscribers.push(callback.clone());
            }
        }
        trace!(event, "subscribed");

        Subscription {
            bus: Arc::downgrade(self),
            event: event.to_string(),
            callback,
        }
    }

    /// Remove `callback` from `event`. No-op if it isn't registered.
    pub fn unsubscribe(&self, event: &str, callback: &Callback) {
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(subscribers) = channels.get_mut(event) {
            subscribers.retain(|existing| !Arc::ptr_eq(existing, callback));
            if subscribers.is_empty() {
                channels.remove(event);
            }
        }
    }

    /// Deliver `payload` to every subscriber of `event`.
    ///
    /// Returns the number of callbacks invoked.
    pub fn publish(&self, event: &str, payload: &EventPayload) -> usize {
        // Callbacks may subscribe or unsubscribe, so the lock is not held
        // while they run.
        let snapshot = {
            let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
            match channels.get(event) {
                Some(subscribers) => subscribers.clone(),
                None => {
                    trace!(event, "dropped event with no subscribers");
                    return 0;
                }
            }
        };

        let mut delivered = 0;
        for callback in &snapshot {
            if !self.is_subscribed(event, callback) {
                continue;
            }
            callback(payload);
            delivered += 1;
        }

        trace!(event, delivered, "published");
        delivered
    }

    /// Number of callbacks currently registered for `event`.
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .map_or(0, Vec::len)
    }

    fn is_subscribed(&self, event: &str, callback: &Callback) -> bool {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .is_some_and(|subscribers| subscribers.iter().any(|c| Arc::ptr_eq(c, callback)))
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        let mut map = f.debug_map();
        for (event, subscribers) in channels.iter() {
            map.entry(event, &subscribers.len());
        }
        map.finish()
    }
}

/// Handle returned by [`EventBus::subscribe`].
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
pub struct Subscription {
    bus: Weak<EventBus>,
    event: String,
    callback: Callback,
}

impl Subscription {
    /// Event name this subscription listens on.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Remove the registration. No-op if the bus is gone.
    pub fn unsubscribe(self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(&self.event, &self.callback);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("event", &self.event).finish()
    }
}
