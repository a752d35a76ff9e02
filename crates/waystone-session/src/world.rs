//! Boundary traits for what lives inside a session.
//!
//! Players, entities and dimensions belong to the engine, not to the
//! registry. The registry never looks inside them; these traits only pin
//! down the little that commands and helpers need.

use std::sync::{Arc, PoisonError, RwLock};

use crate::{PlayerId, WorldId};

/// A participant in a session.
pub trait Player: Send + Sync {
    fn id(&self) -> PlayerId;

    /// Name shown in player lists.
    fn display_name(&self) -> String;

    /// World-space position `[x, y, z]`.
    fn position(&self) -> [f32; 3];

    /// `true` for the player controlled by this process.
    fn is_local(&self) -> bool;

    /// `true` for the player holding session authority.
    fn is_master(&self) -> bool;

    /// Moves the player back to its spawn point. Default: no-op.
    fn respawn(&self) {}
}

pub type PlayerRef = Arc<dyn Player>;

/// Anything registered into a session's entity context.
pub trait Entity: Send + Sync {
    fn id(&self) -> u64;
}

pub type EntityRef = Arc<dyn Entity>;

/// A session's entity context.
pub trait Entities: Send + Sync {
    /// Players currently known to the session.
    fn players(&self) -> Vec<PlayerRef>;

    /// Every registered entity, players included.
    fn entities(&self) -> Vec<EntityRef>;
}

/// A session's loaded scenes.
pub trait Dimensions: Send + Sync {
    /// The world these dimensions belong to, if known.
    fn world(&self) -> Option<WorldId>;

    /// Number of scene slots.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the scene at `index` is fully loaded.
    fn is_loaded(&self, index: usize) -> bool;
}

/// Payload of [`SessionEvents::authority_transferred`](crate::SessionEvents).
#[derive(Clone)]
pub struct AuthorityTransfer {
    /// New authority holder.
    pub current: PlayerRef,
    /// Previous holder; `None` if authority was newly assigned.
    pub previous: Option<PlayerRef>,
}

/// A replaceable player reference.
///
/// The master and local players of a session can change over its life.
/// This gives implementers a ready-made `&self` getter/setter pair.
#[derive(Default)]
pub struct PlayerSlot(RwLock<Option<PlayerRef>>);

impl PlayerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<PlayerRef> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replaces the player and returns the previous one.
    pub fn set(&self, player: Option<PlayerRef>) -> Option<PlayerRef> {
        std::mem::replace(
            &mut *self.0.write().unwrap_or_else(PoisonError::into_inner),
            player,
        )
    }
}
