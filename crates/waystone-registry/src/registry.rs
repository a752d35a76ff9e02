//! The session registry: tracks live sessions and the current one.
//!
//! This is the central piece of the registry layer. It's responsible for:
//! - Adding and removing sessions
//! - Running the current-session handoff (deselect → select → notify)
//! - Asking factories to build sessions by name
//! - Tearing everything down on shutdown
//!
//! # Concurrency note
//!
//! `SessionRegistry` is a cheap-to-clone handle around shared state, so
//! it can be passed to UI code, commands and spawned tasks. The state
//! sits behind a plain `std::sync::Mutex` that is only ever held for a
//! few map operations and **never across an await**. It is not a
//! transaction: two overlapping `set_current` calls can interleave their
//! handoffs, because `current` is updated before the hooks run. Drive
//! the registry from one logical owner if you need strict ordering
//! across calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use waystone_session::{HandoffPhase, HookFuture, SessionError, SessionExt, SessionRef, Signal};

use crate::factory::same_factory;
use crate::{EventBus, FactoryRef, Options, RegistryConfig, RegistryEvent, RemovalPolicy};

/// Payload of [`RegistrySignals::current_changed`].
#[derive(Debug, Clone)]
pub struct CurrentChange {
    /// The session that was current, if any.
    pub previous: Option<SessionRef>,
    /// The session that is current now, if any.
    pub current: Option<SessionRef>,
}

/// In-process notifications raised by the registry.
///
/// Every signal fires after the registry's own state is updated and
/// with no lock held, so handlers may call back into the registry.
#[derive(Debug, Default)]
pub struct RegistrySignals {
    pub session_added: Signal<SessionRef>,
    pub session_removed: Signal<SessionRef>,
    pub current_changed: Signal<CurrentChange>,
    pub factory_added: Signal<FactoryRef>,
    pub factory_removed: Signal<FactoryRef>,
}

/// Tracks every live session and which one is current.
///
/// ## Lifecycle
///
/// ```text
/// try_make() ──→ add() ──→ set_current() ──→ remove() / close_all()
///     │            │             │                   │
///     ▼            ▼             ▼                   ▼
/// [created]     [added]    [current changed]     [removed]
/// ```
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<Inner>,
}

struct Inner {
    config: RegistryConfig,
    bus: Arc<dyn EventBus>,
    state: Mutex<RegistryState>,
    signals: RegistrySignals,
}

#[derive(Default)]
struct RegistryState {
    /// Live sessions keyed by id. Insertion order doesn't matter.
    sessions: HashMap<String, SessionRef>,

    /// Id of the current session. Invariant: if `Some`, it's a key of
    /// `sessions`.
    current: Option<String>,

    /// Registered factories. Order is trial order for `try_make`.
    factories: Vec<FactoryRef>,
}

/// The two sessions involved in a pending handoff. Produced once
/// `current` has already been updated.
struct Switch {
    previous: Option<SessionRef>,
    next: Option<SessionRef>,
}

impl SessionRegistry {
    /// Creates an empty registry that publishes to `bus`.
    pub fn new(config: RegistryConfig, bus: Arc<dyn EventBus>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                bus,
                state: Mutex::new(RegistryState::default()),
                signals: RegistrySignals::default(),
            }),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Local subscription points (added, removed, current changed, ...).
    pub fn signals(&self) -> &RegistrySignals {
        &self.inner.signals
    }

    // =====================================================================
    // Sessions
    // =====================================================================

    /// Adds a session.
    ///
    /// No-op (returns `false`, no event) if a session with the same id is
    /// already registered.
    pub fn add(&self, session: SessionRef) -> bool {
        {
            let mut state = self.lock();
            if state.sessions.contains_key(session.id()) {
                tracing::debug!(session_id = %session.id(), "add ignored: already registered");
                return false;
            }
            state
                .sessions
                .insert(session.id().to_string(), Arc::clone(&session));
        }

        tracing::info!(session_id = %session.id(), "session added");
        self.inner.signals.session_added.emit(&session);
        self.inner.bus.emit(RegistryEvent::SessionAdded(session));
        true
    }

    /// Removes the session with `id`. Returns `Ok(false)` if it wasn't
    /// registered.
    ///
    /// If it was current, another session (any of the rest) is promoted,
    /// or `current` becomes `None` when it was the last one. How the
    /// promotion's handoff is ordered against the removal depends on
    /// [`RemovalPolicy`]. `remove` does **not** dispose the session.
    ///
    /// # Errors
    /// Only with [`RemovalPolicy::Awaited`]: a failing promotion hook is
    /// returned, and the session is left registered.
    pub async fn remove(&self, id: &str) -> Result<bool, SessionError> {
        match self.inner.config.removal {
            RemovalPolicy::Detached => Ok(self.remove_detached(id)),
            RemovalPolicy::Awaited => self.remove_awaited(id).await,
        }
    }

    /// Removal that never suspends: the promotion handoff (if any) is
    /// spawned and the session is removed right away.
    fn remove_detached(&self, id: &str) -> bool {
        let (removed, switch) = {
            let mut state = self.lock();
            if !state.sessions.contains_key(id) {
                tracing::debug!(session_id = %id, "remove ignored: not registered");
                return false;
            }
            let switch = promote_replacement(&mut state, id);
            (state.sessions.remove(id), switch)
        };

        if let Some(switch) = switch {
            self.spawn_switch(switch);
        }
        if let Some(session) = removed {
            self.announce_removed(session);
        }
        true
    }

    async fn remove_awaited(&self, id: &str) -> Result<bool, SessionError> {
        let switch = {
            let mut state = self.lock();
            if !state.sessions.contains_key(id) {
                tracing::debug!(session_id = %id, "remove ignored: not registered");
                return Ok(false);
            }
            promote_replacement(&mut state, id)
        };

        if let Some(switch) = switch {
            self.complete_switch(switch).await?;
        }

        // A dispose-on-change handoff has already removed and announced it.
        if let Some(session) = self.lock().sessions.remove(id) {
            self.announce_removed(session);
        }
        Ok(true)
    }

    fn announce_removed(&self, session: SessionRef) {
        tracing::info!(session_id = %session.id(), "session removed");
        self.inner.signals.session_removed.emit(&session);
        self.inner.bus.emit(RegistryEvent::SessionRemoved(session));
    }

    /// Looks up a session by id.
    pub fn try_get(&self, id: &str) -> Option<SessionRef> {
        self.lock().sessions.get(id).cloned()
    }

    pub fn has(&self, id: &str) -> bool {
        self.lock().sessions.contains_key(id)
    }

    /// Point-in-time copy of every session. Safe to iterate while the
    /// registry keeps changing.
    pub fn sessions(&self) -> Vec<SessionRef> {
        self.lock().sessions.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().sessions.is_empty()
    }

    // =====================================================================
    // Current session
    // =====================================================================

    /// Id of the current session, if any.
    pub fn current_id(&self) -> Option<String> {
        self.lock().current.clone()
    }

    /// The current session, if any.
    pub fn current(&self) -> Option<SessionRef> {
        let state = self.lock();
        state
            .current
            .as_ref()
            .and_then(|id| state.sessions.get(id))
            .cloned()
    }

    pub fn is_current(&self, id: &str) -> bool {
        self.lock().current.as_deref() == Some(id)
    }

    /// Makes the session with `id` current; `None` leaves no session
    /// current.
    ///
    /// 1. Same as the current id → nothing happens.
    /// 2. Unknown id → nothing happens.
    /// 3. `current` is updated immediately.
    /// 4. The old session's `on_deselect(new)` is awaited.
    /// 5. The new session's `on_select(old)` is awaited.
    /// 6. `current_changed(old, new)` fires.
    /// 7. If the old session is dispose-on-change, it's disposed and removed.
    ///
    /// # Errors
    /// A failing (or, with a timeout configured, slow) hook is returned as
    /// is. There is no rollback: `current` keeps the new value and the
    /// remaining steps are skipped.
    pub async fn set_current(&self, id: Option<&str>) -> Result<(), SessionError> {
        let switch = {
            let mut state = self.lock();
            begin_switch(&mut state, id)
        };
        match switch {
            Some(switch) => self.complete_switch(switch).await,
            None => Ok(()),
        }
    }

    /// Steps 4–7 of [`set_current`](Self::set_current).
    async fn complete_switch(&self, switch: Switch) -> Result<(), SessionError> {
        let Switch { previous, next } = switch;

        if let Some(old) = &previous {
            tracing::debug!(session_id = %old.id(), "deselecting");
            self.run_hook(old.id(), HandoffPhase::Deselect, old.on_deselect(next.clone()))
                .await?;
        }
        if let Some(new) = &next {
            tracing::debug!(session_id = %new.id(), "selecting");
            self.run_hook(new.id(), HandoffPhase::Select, new.on_select(previous.clone()))
                .await?;
        }

        tracing::info!(
            previous = previous.as_ref().map(|s| s.id()),
            current = next.as_ref().map(|s| s.id()),
            "current session changed"
        );
        let change = CurrentChange {
            previous: previous.clone(),
            current: next.clone(),
        };
        self.inner.signals.current_changed.emit(&change);
        self.inner.bus.emit(RegistryEvent::CurrentChanged {
            previous: change.previous,
            current: change.current,
        });

        if let Some(old) = previous {
            if old.is_dispose_on_change().await {
                tracing::info!(session_id = %old.id(), "disposing session on change");
                self.run_hook(old.id(), HandoffPhase::Dispose, old.dispose())
                    .await?;
                // `old` is not current here, so no promotion is needed;
                // the detached path is enough and keeps this fn from
                // recursing into itself.
                self.remove_detached(old.id());
            }
        }
        Ok(())
    }

    /// Runs a switch's handoff on a background task.
    ///
    /// Kept as a plain (non-async) fn: it's the only place a handoff is
    /// spawned, and it keeps `complete_switch`'s future type acyclic.
    fn spawn_switch(&self, switch: Switch) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime: promotion handoff skipped");
            return;
        };
        let registry = self.clone();
        runtime.spawn(async move {
            if let Err(e) = registry.complete_switch(switch).await {
                tracing::warn!(error = %e, "detached promotion handoff failed");
            }
        });
    }

    /// Disposes `session` under the configured handoff timeout. The
    /// session stays registered; pair with [`remove`](Self::remove).
    pub async fn dispose(&self, session: &SessionRef) -> Result<(), SessionError> {
        tracing::debug!(session_id = %session.id(), "disposing");
        self.run_hook(session.id(), HandoffPhase::Dispose, session.dispose())
            .await
    }

    async fn run_hook(
        &self,
        id: &str,
        phase: HandoffPhase,
        hook: HookFuture<'_>,
    ) -> Result<(), SessionError> {
        match self.inner.config.handoff_timeout {
            Some(after) => tokio::time::timeout(after, hook).await.map_err(|_| {
                SessionError::TimedOut {
                    id: id.to_string(),
                    phase,
                    after,
                }
            })?,
            None => hook.await,
        }
    }

    // =====================================================================
    // Factories
    // =====================================================================

    /// Registers a factory. No-op (returns `false`) if this exact factory
    /// is already registered.
    pub fn register(&self, factory: FactoryRef) -> bool {
        {
            let mut state = self.lock();
            if state.factories.iter().any(|f| same_factory(f, &factory)) {
                return false;
            }
            state.factories.push(Arc::clone(&factory));
        }

        tracing::info!(factory = factory.name(), "session factory registered");
        self.inner.signals.factory_added.emit(&factory);
        self.inner.bus.emit(RegistryEvent::FactoryAdded(factory));
        true
    }

    /// Unregisters a factory. No-op (returns `false`) if it isn't registered.
    pub fn unregister(&self, factory: &FactoryRef) -> bool {
        let removed = {
            let mut state = self.lock();
            let position = state.factories.iter().position(|f| same_factory(f, factory));
            position.map(|i| state.factories.remove(i))
        };
        let Some(factory) = removed else {
            return false;
        };

        tracing::info!(factory = factory.name(), "session factory unregistered");
        self.inner.signals.factory_removed.emit(&factory);
        self.inner.bus.emit(RegistryEvent::FactoryRemoved(factory));
        true
    }

    /// Snapshot of the registered factories, in trial order.
    pub fn factories(&self) -> Vec<FactoryRef> {
        self.lock().factories.clone()
    }

    /// Asks each factory, in registration order, to build a session for
    /// `name`. The first one that does wins: the session is announced as
    /// created, added, and returned. Later factories are not consulted.
    ///
    /// `None` if no factory accepts `name`; that's a normal outcome.
    pub fn try_make(&self, name: &str, options: &Options) -> Option<SessionRef> {
        for factory in self.factories() {
            let Some(session) = factory.try_make_session(name, options) else {
                continue;
            };
            tracing::info!(
                factory = factory.name(),
                kind = name,
                session_id = %session.id(),
                "session created"
            );
            self.inner
                .bus
                .emit(RegistryEvent::SessionCreated(Arc::clone(&session)));
            self.add(Arc::clone(&session));
            return Some(session);
        }

        tracing::debug!(kind = name, "no factory accepted session kind");
        None
    }

    // =====================================================================
    // Teardown
    // =====================================================================

    /// Deselects the current session, then disposes and removes every
    /// session.
    ///
    /// # Errors
    /// Stops at the first failing hook; sessions not reached yet stay
    /// registered.
    pub async fn close_all(&self) -> Result<(), SessionError> {
        self.set_current(None).await?;

        for session in self.sessions() {
            self.dispose(&session).await?;
            self.remove(session.id()).await?;
        }

        // Sessions added by a hook while we were closing are dropped
        // without disposal.
        let leftovers = {
            let mut state = self.lock();
            state.current = None;
            state.sessions.drain().count()
        };
        if leftovers > 0 {
            tracing::warn!(leftovers, "sessions added during close_all were dropped");
        }
        Ok(())
    }

    /// [`close_all`](Self::close_all), then unregisters every factory.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.close_all().await?;
        for factory in self.factories() {
            self.unregister(&factory);
        }
        tracing::info!("session registry shut down");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SessionRegistry")
            .field("sessions", &state.sessions.len())
            .field("current", &state.current)
            .field("factories", &state.factories.len())
            .finish()
    }
}

/// Steps 1–3 of the selection protocol, under the lock.
///
/// Returns `None` when there's nothing to do (same id, or unknown id).
fn begin_switch(state: &mut RegistryState, id: Option<&str>) -> Option<Switch> {
    if state.current.as_deref() == id {
        tracing::debug!(session_id = ?id, "set_current ignored: already current");
        return None;
    }

    let next = match id {
        Some(id) => match state.sessions.get(id) {
            Some(session) => Some(Arc::clone(session)),
            None => {
                tracing::debug!(session_id = %id, "set_current ignored: unknown session");
                return None;
            }
        },
        None => None,
    };
    let previous = state
        .current
        .as_ref()
        .and_then(|current| state.sessions.get(current))
        .cloned();

    state.current = id.map(str::to_string);
    Some(Switch { previous, next })
}

/// If `removing` is current, points `current` at some other session (or
/// `None`) and returns the handoff to run.
fn promote_replacement(state: &mut RegistryState, removing: &str) -> Option<Switch> {
    if state.current.as_deref() != Some(removing) {
        return None;
    }
    let replacement = state
        .sessions
        .keys()
        .find(|id| id.as_str() != removing)
        .cloned();
    begin_switch(state, replacement.as_deref())
}
