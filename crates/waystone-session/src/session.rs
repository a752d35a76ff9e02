//! The session contract.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::BoxFuture;
use waystone_props::PropertyObject;

use crate::{
    AuthorityTransfer, Dimensions, Entities, EntityRef, NetSession, PlayerRef, SessionError,
    Signal, State,
};

/// A shared, type-erased session. This is what the registry stores.
pub type SessionRef = Arc<dyn Session>;

/// Future returned by the lifecycle hooks.
///
/// Hooks return a boxed future (instead of being `async fn`) so that
/// `Session` stays object safe: the registry holds sessions of many
/// concrete types behind `Arc<dyn Session>`.
pub type HookFuture<'a> = BoxFuture<'a, Result<(), SessionError>>;

/// Notification points every session exposes.
///
/// The registry itself only listens to `state_changed` (through
/// [`when_finished`](crate::when_finished)); the rest are for UI, commands
/// and game code.
#[derive(Default)]
pub struct SessionEvents {
    /// A player joined. Fired after the player's entity is registered.
    pub player_joined: Signal<PlayerRef>,
    /// A player left. Fired before the player's entity is unregistered.
    pub player_left: Signal<PlayerRef>,
    pub authority_transferred: Signal<AuthorityTransfer>,
    /// `true` when the player gained a physical representation.
    pub player_visibility: Signal<(PlayerRef, bool)>,
    pub entity_registered: Signal<EntityRef>,
    pub entity_unregistered: Signal<EntityRef>,
    pub state_changed: Signal<State>,
}

/// A live unit of participation (a joined world, a server connection, ...).
///
/// # Identity
///
/// [`id`](Self::id) is immutable and is the only thing that matters for
/// equality: two session values with the same id are the same session.
///
/// # Lifecycle
///
/// ```text
/// factory builds it ──→ registry.add() ──→ on_select / on_deselect (0..n)
///                                                    │
///                                                    ▼
///                                              dispose() ──→ removed
/// ```
///
/// `dispose` must tolerate being called more than once; [`DisposeFlag`]
/// is a small helper for that.
///
/// # Optional capabilities
///
/// - networking: override [`as_net`](Self::as_net)
/// - editable metadata: override
///   [`PropertyObject::as_editable`](waystone_props::PropertyObject::as_editable)
pub trait Session: PropertyObject + Send + Sync + 'static {
    /// Unique id within a registry.
    fn id(&self) -> &str;

    /// Current readiness. Changes are announced on `events().state_changed`.
    fn state(&self) -> State;

    fn events(&self) -> &SessionEvents;

    fn master_player(&self) -> Option<PlayerRef>;

    fn set_master_player(&self, player: Option<PlayerRef>);

    fn local_player(&self) -> Option<PlayerRef>;

    fn set_local_player(&self, player: Option<PlayerRef>);

    /// Loaded scenes. Opaque to the registry.
    fn dimensions(&self) -> Option<&dyn Dimensions> {
        None
    }

    /// Entity context. Opaque to the registry.
    fn entities(&self) -> Option<&dyn Entities> {
        None
    }

    /// Called periodically by the host's update driver. Default: no-op.
    fn update(&self) {}

    /// The session is becoming current. `previous` is the session that
    /// was current before, if any.
    fn on_select(&self, previous: Option<SessionRef>) -> HookFuture<'_>;

    /// The session stops being current. `next` is the session taking
    /// over, if any.
    fn on_deselect(&self, next: Option<SessionRef>) -> HookFuture<'_>;

    /// Releases everything the session holds.
    fn dispose(&self) -> HookFuture<'_>;

    /// Runtime check for the networked capability.
    fn as_net(&self) -> Option<&dyn NetSession> {
        None
    }
}

impl PartialEq for dyn Session {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for dyn Session {}

impl fmt::Debug for dyn Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id())
            .field("status", &self.state().status)
            .finish()
    }
}

/// One-shot "already disposed?" flag for `Session::dispose` implementations.
#[derive(Debug, Default)]
pub struct DisposeFlag(AtomicBool);

impl DisposeFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the owner disposed. Returns `true` only on the first call.
    pub fn mark(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    pub fn is_disposed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispose_flag_marks_once() {
        let flag = DisposeFlag::new();
        assert!(!flag.is_disposed());
        assert!(flag.mark());
        assert!(!flag.mark());
        assert!(flag.is_disposed());
    }
}
