//! Renderer-side state fed by the event bus.
//!
//! [`ToastCenter`] keeps the ordered list of visible toasts; each toast gets
//! an id on arrival and disappears when dismissed or when its duration runs
//! out. [`AuthModalState`] records requests to reopen the sign-in modal until
//! the front-end acknowledges them.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::bus::{EventBus, EventPayload, OPEN_AUTH_MODAL_EVENT, Subscription, TOAST_EVENT};
use crate::types::{Severity, ToastRequest};

/// A toast currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub duration_ms: u64,
    pub created_at: Instant,
}

impl Toast {
    /// Instant after which the toast is removed.
    pub fn expires_at(&self) -> Instant {
        self.created_at + Duration::from_millis(self.duration_ms)
    }

    /// Check if the toast has outlived its duration at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at()
    }
}

/// Ordered list of active toasts.
#[derive(Debug, Default)]
pub struct ToastCenter {
    toasts: Mutex<Vec<Toast>>,
    next_id: AtomicU64,
    subscription: Mutex<Option<Subscription>>,
}

impl ToastCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a center and subscribe it to the `"toast"` channel.
    pub fn attach(bus: &Arc<EventBus>) -> Arc<Self> {
        let center = Arc::new(Self::new());
        let weak = Arc::downgrade(&center);

        let subscription = bus.subscribe(
            TOAST_EVENT,
            Arc::new(move |payload: &EventPayload| {
                let Some(center) = weak.upgrade() else {
                    return;
                };
                match payload {
                    EventPayload::Toast(request) => {
                        center.push(request.clone());
                    }
                    other => debug!(?other, "ignoring toast event without a toast payload"),
                }
            }),
        );

        *center.subscription.lock().unwrap_or_else(PoisonError::into_inner) = Some(subscription);
        center
    }

    /// Stop listening on the bus. Toasts already shown stay until they expire.
    pub fn detach(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
    }

    /// Show a toast. Returns its id.
    pub fn push(&self, request: ToastRequest) -> u64 {
        self.push_at(request, Instant::now())
    }

    /// Show a toast created at `now`.
    pub fn push_at(&self, request: ToastRequest, now: Instant) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(id, severity = %request.severity, "toast shown");

        self.lock().push(Toast {
            id,
            message: request.message,
            severity: request.severity,
            duration_ms: request.duration_ms,
            created_at: now,
        });
        id
    }

    /// Remove a toast by id. Returns false if it was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut toasts = self.lock();
        let before = toasts.len();
        toasts.retain(|t| t.id != id);
        toasts.len() != before
    }

    /// Drop every toast whose duration has elapsed at `now`.
    ///
    /// Returns the ids removed.
    pub fn expire(&self, now: Instant) -> Vec<u64> {
        let mut toasts = self.lock();
        let expired: Vec<u64> = toasts
            .iter()
            .filter(|t| t.is_expired(now))
            .map(|t| t.id)
            .collect();
        toasts.retain(|t| !t.is_expired(now));
        expired
    }

    /// Snapshot of the visible toasts, oldest first.
    ///
    /// Toasts whose duration has elapsed are dropped first.
    pub fn active(&self) -> Vec<Toast> {
        self.active_at(Instant::now())
    }

    /// Snapshot of the toasts still visible at `now`.
    pub fn active_at(&self, now: Instant) -> Vec<Toast> {
        let mut toasts = self.lock();
        toasts.retain(|t| !t.is_expired(now));
        toasts.clone()
    }

    /// Time until the next toast expires, if any are showing.
    pub fn next_expiry(&self, now: Instant) -> Option<Duration> {
        self.lock()
            .iter()
            .map(|t| t.expires_at().saturating_duration_since(now))
            .min()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Toast>> {
        self.toasts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Pending requests to reopen the sign-in modal.
#[derive(Debug, Default)]
pub struct AuthModalState {
    pending: AtomicUsize,
    total: AtomicUsize,
}

impl AuthModalState {
    /// Create the state and subscribe it to `"open-auth-modal"`.
    pub fn attach(bus: &Arc<EventBus>) -> Arc<Self> {
        let state = Arc::new(Self::default());
        let weak = Arc::downgrade(&state);

        bus.subscribe(
            OPEN_AUTH_MODAL_EVENT,
            Arc::new(move |_: &EventPayload| {
                if let Some(state) = weak.upgrade() {
                    state.pending.fetch_add(1, Ordering::SeqCst);
                    state.total.fetch_add(1, Ordering::SeqCst);
                }
            }),
        );

        state
    }

    /// Acknowledge outstanding requests. True if the modal should open.
    pub fn take_request(&self) -> bool {
        self.pending.swap(0, Ordering::SeqCst) > 0
    }

    /// Check if a request is waiting without acknowledging it.
    pub fn is_requested(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    /// Requests received since creation.
    pub fn total_requests(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_keep_arrival_order_and_unique_ids() {
        let center = ToastCenter::new();
        let a = center.push(ToastRequest::info("first"));
        let b = center.push(ToastRequest::success("second"));

        assert_ne!(a, b);
        let active = center.active();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].message, "first");
        assert_eq!(active[1].severity, Severity::Success);
    }

    #[test]
    fn test_dismiss_by_id() {
        let center = ToastCenter::new();
        let a = center.push(ToastRequest::info("a"));
        let b = center.push(ToastRequest::info("b"));

        assert!(center.dismiss(a));
        assert!(!center.dismiss(a));
        let active = center.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b);
    }

    #[test]
    fn test_expire_removes_only_elapsed() {
        let center = ToastCenter::new();
        let start = Instant::now();
        let short = center.push_at(ToastRequest::info("short").with_duration_ms(100), start);
        let long = center.push_at(ToastRequest::info("long").with_duration_ms(5000), start);

        assert!(center.expire(start + Duration::from_millis(50)).is_empty());
        assert_eq!(center.expire(start + Duration::from_millis(100)), vec![short]);
        assert_eq!(center.active()[0].id, long);
        assert_eq!(
            center.next_expiry(start + Duration::from_millis(1000)),
            Some(Duration::from_millis(4000))
        );
    }

    #[test]
    fn test_active_drops_elapsed_toasts() {
        let center = ToastCenter::new();
        center.push(ToastRequest::info("brief").with_duration_ms(20));
        let kept = center.push(ToastRequest::info("sticky").with_duration_ms(60_000));

        std::thread::sleep(Duration::from_millis(100));

        let active = center.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, kept);
        assert!(center.expire(Instant::now()).is_empty());
    }

    #[test]
    fn test_active_at_uses_given_instant() {
        let center = ToastCenter::new();
        let start = Instant::now();
        center.push_at(ToastRequest::info("short").with_duration_ms(100), start);

        assert_eq!(center.active_at(start + Duration::from_millis(99)).len(), 1);
        assert!(center.active_at(start + Duration::from_millis(100)).is_empty());
    }

    #[test]
    fn test_attach_receives_bus_toasts() {
        let bus = Arc::new(EventBus::new());
        let center = ToastCenter::attach(&bus);

        bus.publish(TOAST_EVENT, &ToastRequest::warning("Session expired").into());
        bus.publish(TOAST_EVENT, &EventPayload::Empty);

        let active = center.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].severity, Severity::Warning);

        center.detach();
        bus.publish(TOAST_EVENT, &ToastRequest::info("ignored").into());
        assert_eq!(center.active().len(), 1);
    }

    #[test]
    fn test_auth_modal_requests_are_acknowledged_once() {
        let bus = Arc::new(EventBus::new());
        let modal = AuthModalState::attach(&bus);

        assert!(!modal.take_request());
        bus.publish(OPEN_AUTH_MODAL_EVENT, &EventPayload::Empty);
        bus.publish(OPEN_AUTH_MODAL_EVENT, &EventPayload::Empty);

        assert!(modal.is_requested());
        assert!(modal.take_request());
        assert!(!modal.take_request());
        assert_eq!(modal.total_requests(), 2);
    }
}
