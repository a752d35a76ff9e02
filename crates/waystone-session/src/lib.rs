//! Session contracts for Waystone.
//!
//! A **session** is one live unit of participation: a joined world, a
//! connection to a server, a local sandbox. This crate defines what a
//! session must look like so the registry can manage it without knowing
//! its concrete type:
//!
//! 1. **State**: readiness of the session ([`State`], [`Status`])
//! 2. **Contract**: identity, handoff hooks, disposal ([`Session`])
//! 3. **Notifications**: multicast [`Signal`]s with subscription handles
//! 4. **Capabilities**: optional extras checked at runtime
//!    ([`NetSession`], editable properties)
//! 5. **Metadata**: well-known properties ([`SessionExt`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Registry Layer (above)  ← selects, tracks, and disposes sessions
//!     ↕
//! Session Layer (this crate)  ← what a session is and what it can do
//!     ↕
//! Property Layer (below)  ← lazily-resolved metadata bags
//! ```

mod error;
mod finished;
mod ids;
mod metadata;
mod net;
mod session;
mod signal;
mod state;
mod world;

pub use error::{HandoffPhase, SessionError};
pub use finished::when_finished;
pub use ids::{InstanceId, PlayerId, Thumbnail, WorldId, generate_session_id};
pub use metadata::{SessionExt, keys};
pub use net::{NetEvent, NetEvents, NetSession};
pub use session::{DisposeFlag, HookFuture, Session, SessionEvents, SessionRef};
pub use signal::{Signal, SubscriptionId};
pub use state::{State, Status};
pub use world::{
    AuthorityTransfer, Dimensions, Entities, Entity, EntityRef, Player, PlayerRef, PlayerSlot,
};
