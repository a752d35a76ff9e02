//! Multicast notification points with explicit subscription handles.
//!
//! Instead of exposing a mutable list of callbacks, every notification
//! point is a [`Signal`]. You [`subscribe`](Signal::subscribe) a closure
//! and get back a [`SubscriptionId`]; you hand that id back to
//! [`unsubscribe`](Signal::unsubscribe) when you're done.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Opaque handle returned by [`Signal::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A multicast notification point carrying values of type `T`.
///
/// Guarantees:
/// - each subscription is delivered at most once per [`emit`](Self::emit)
/// - a handler removed during an emit (by itself or by an earlier
///   handler) is not called afterwards
/// - handlers may subscribe/unsubscribe from inside a callback without
///   deadlocking: the lock is released before any handler runs
pub struct Signal<T> {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(SubscriptionId, Handler<T>)>>,
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handlers: Mutex::new(Vec::new()),
        }
    }

    /// Registers `handler`. Handlers run in subscription order.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(handler)));
        id
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.lock();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    /// Delivers `value` to every live subscription. Returns how many
    /// handlers ran.
    pub fn emit(&self, value: &T) -> usize {
        // Snapshot, then release the lock so handlers can (un)subscribe.
        let snapshot: Vec<(SubscriptionId, Handler<T>)> = self.lock().clone();
        let mut delivered = 0;
        for (id, handler) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }
            handler(value);
            delivered += 1;
        }
        delivered
    }

    /// Returns `true` if `id` is still registered.
    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.lock().iter().any(|(existing, _)| *existing == id)
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every subscription.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Handler<T>)>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.len())
            .finish()
    }
}
