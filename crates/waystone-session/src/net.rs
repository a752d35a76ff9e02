//! The optional networked capability.

use std::sync::Arc;
use std::time::SystemTime;

use futures_util::future::BoxFuture;

use crate::{PlayerRef, Session, SessionError, Signal};

/// A custom event received from the network.
#[derive(Clone)]
pub struct NetEvent {
    /// Application-defined event code.
    pub code: i64,
    /// Raw payload, shared between subscribers.
    pub raw: Arc<[u8]>,
    /// The player who sent it, when the session knows.
    pub sender: Option<PlayerRef>,
}

/// Notifications specific to networked sessions.
#[derive(Default)]
pub struct NetEvents {
    pub connected: Signal<()>,
    /// Carries the disconnect reason.
    pub disconnected: Signal<String>,
    pub event_received: Signal<NetEvent>,
}

/// A session backed by a network connection.
///
/// Not every session has one: callers check with
/// [`Session::as_net`] before using any of this.
///
/// ```rust,ignore
/// if let Some(net) = session.as_net() {
///     println!("ping: {:?}", net.ping_ms());
/// }
/// ```
pub trait NetSession: Session {
    fn is_connected(&self) -> bool;

    /// Server clock (UTC).
    fn server_time(&self) -> SystemTime;

    /// Round-trip latency in milliseconds; `None` when unknown.
    fn ping_ms(&self) -> Option<u32>;

    /// Sends a custom event from the local player.
    ///
    /// Resolves to `Ok(true)` if the event was accepted for delivery.
    fn emit_event(&self, code: i64, raw: Vec<u8>) -> BoxFuture<'_, Result<bool, SessionError>>;

    fn net_events(&self) -> &NetEvents;
}
