//! Waiting for a session to finish starting up.

use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use futures_util::future::{self, Either};
use tokio::sync::oneshot;

use crate::{SessionRef, State, SubscriptionId};

/// Resolves to `true` once `session` is [`Ready`](crate::Status::Ready),
/// or `false` once it is in [`Error`](crate::Status::Error).
///
/// - Already finished: resolves immediately, no listener is registered.
/// - Otherwise: listens on `state_changed`, and on the first finished
///   state removes its own subscription and resolves exactly once.
///
/// Each call is independent, so any number of callers can wait on the
/// same session at once. The listener holds only a weak reference to
/// the session; if the session is dropped before finishing, the future
/// resolves to `false`.
pub fn when_finished(session: &SessionRef) -> impl Future<Output = bool> + Send + 'static {
    let state = session.state();
    if state.is_finished() {
        return Either::Left(future::ready(state.is_ready()));
    }

    tracing::debug!(session_id = %session.id(), status = %state.status, "waiting for session to finish");

    let (tx, rx) = oneshot::channel::<bool>();
    let waiter = Arc::new(Waiter {
        tx: Mutex::new(Some(tx)),
        subscription: OnceLock::new(),
    });
    let weak = Arc::downgrade(session);

    let handler = {
        let waiter = Arc::clone(&waiter);
        move |state: &State| {
            if !state.is_finished() {
                return;
            }
            if let (Some(id), Some(session)) = (waiter.subscription.get(), weak.upgrade()) {
                session.events().state_changed.unsubscribe(*id);
            }
            waiter.resolve(state.is_ready());
        }
    };
    let id = session.events().state_changed.subscribe(handler);
    let _ = waiter.subscription.set(id);

    // The state may have finished between the first check and the
    // subscription; that change would never reach the handler.
    let state = session.state();
    if state.is_finished() {
        session.events().state_changed.unsubscribe(id);
        waiter.resolve(state.is_ready());
    }

    Either::Right(async move { rx.await.unwrap_or(false) })
}

struct Waiter {
    tx: Mutex<Option<oneshot::Sender<bool>>>,
    subscription: OnceLock<SubscriptionId>,
}

impl Waiter {
    fn resolve(&self, ready: bool) {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(tx) = tx {
            let _ = tx.send(ready);
        }
    }
}
