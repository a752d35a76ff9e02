//! Process-wide registry events and the bus they travel on.
//!
//! Local listeners subscribe to the registry's
//! [`RegistrySignals`](crate::RegistrySignals). Everyone else (UI, CLI,
//! other subsystems) listens on an [`EventBus`], where every event has a
//! stable name:
//!
//! | Name | Payload |
//! |---|---|
//! | `session_added` | session |
//! | `session_removed` | session |
//! | `session_current_changed` | previous, current |
//! | `session_created` | session |
//! | `session_register_added` | factory |
//! | `session_register_removed` | factory |

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::FactoryRef;
use waystone_session::SessionRef;

/// Stable event names.
pub mod names {
    pub const SESSION_ADDED: &str = "session_added";
    pub const SESSION_REMOVED: &str = "session_removed";
    pub const SESSION_CURRENT_CHANGED: &str = "session_current_changed";
    pub const SESSION_CREATED: &str = "session_created";
    pub const SESSION_REGISTER_ADDED: &str = "session_register_added";
    pub const SESSION_REGISTER_REMOVED: &str = "session_register_removed";
}

/// An event emitted by the registry.
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    SessionAdded(SessionRef),
    SessionRemoved(SessionRef),
    CurrentChanged {
        previous: Option<SessionRef>,
        current: Option<SessionRef>,
    },
    /// A factory built a session. Always followed by an add attempt.
    SessionCreated(SessionRef),
    FactoryAdded(FactoryRef),
    FactoryRemoved(FactoryRef),
}

impl RegistryEvent {
    /// The event's stable name (see [`names`]).
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionAdded(_) => names::SESSION_ADDED,
            Self::SessionRemoved(_) => names::SESSION_REMOVED,
            Self::CurrentChanged { .. } => names::SESSION_CURRENT_CHANGED,
            Self::SessionCreated(_) => names::SESSION_CREATED,
            Self::FactoryAdded(_) => names::SESSION_REGISTER_ADDED,
            Self::FactoryRemoved(_) => names::SESSION_REGISTER_REMOVED,
        }
    }

    /// A serializable summary: the name plus the ids (or factory names)
    /// of the payload, in payload order.
    pub fn record(&self) -> EventRecord {
        let session = |s: &SessionRef| Some(s.id().to_string());
        let payload = match self {
            Self::SessionAdded(s) | Self::SessionRemoved(s) | Self::SessionCreated(s) => {
                vec![session(s)]
            }
            Self::CurrentChanged { previous, current } => {
                vec![
                    previous.as_ref().and_then(session),
                    current.as_ref().and_then(session),
                ]
            }
            Self::FactoryAdded(f) | Self::FactoryRemoved(f) => vec![Some(f.name().to_string())],
        };
        EventRecord {
            name: self.name().to_string(),
            payload,
        }
    }
}

/// Wire form of a [`RegistryEvent`].
///
/// Sessions and factories aren't serializable themselves, so the record
/// carries their ids. `None` stands for "no session" (e.g. no previous
/// current session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub name: String,
    pub payload: Vec<Option<String>>,
}

impl EventRecord {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Destination for registry events.
///
/// `emit` is synchronous and must not block: the registry calls it while
/// running its own operations.
pub trait EventBus: Send + Sync + 'static {
    fn emit(&self, event: RegistryEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBus;

impl EventBus for NullBus {
    fn emit(&self, _event: RegistryEvent) {}
}

/// Fans events out to any number of async subscribers.
///
/// Backed by a `tokio::sync::broadcast` channel: subscribers that fall
/// more than `capacity` events behind skip the oldest ones (and a warning
/// is logged).
#[derive(Debug, Clone)]
pub struct BroadcastBus {
    tx: broadcast::Sender<RegistryEvent>,
}

impl BroadcastBus {
    pub const DEFAULT_CAPACITY: usize = 64;

    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribes to every event.
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            rx: self.tx.subscribe(),
            filter: None,
        }
    }

    /// Subscribes to the events whose name is in `names`.
    pub fn subscribe_to(&self, names: &[&'static str]) -> EventSubscriber {
        EventSubscriber {
            rx: self.tx.subscribe(),
            filter: Some(names.to_vec()),
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl EventBus for BroadcastBus {
    fn emit(&self, event: RegistryEvent) {
        tracing::trace!(event = event.name(), "bus emit");
        // `send` only fails when nobody is subscribed, which is fine.
        let _ = self.tx.send(event);
    }
}

/// Receiving end of a [`BroadcastBus`] subscription.
#[derive(Debug)]
pub struct EventSubscriber {
    rx: broadcast::Receiver<RegistryEvent>,
    filter: Option<Vec<&'static str>>,
}

impl EventSubscriber {
    /// Waits for the next matching event. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<RegistryEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next matching event if one is already queued.
    pub fn try_recv(&mut self) -> Option<RegistryEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged, events dropped");
                }
                Err(_) => return None,
            }
        }
    }

    fn accepts(&self, event: &RegistryEvent) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|names| names.contains(&event.name()))
    }
}
