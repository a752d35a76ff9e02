//! # Waystone
//!
//! Session registry for multiplayer game clients.
//!
//! A client can be part of several sessions at once (a local hub, a
//! remote server, ...) but only one of them is **current**. Waystone
//! tracks the sessions, runs the handoff when the current one changes,
//! and lets pluggable factories create new sessions by name.
//!
//! ## Crates
//!
//! | Crate | Layer |
//! |---|---|
//! | `waystone-props` | lazy property bags |
//! | `waystone-session` | the `Session` contract, states, signals |
//! | `waystone-registry` | `SessionRegistry`, factories, event bus |
//! | `waystone-settings` | JSON settings store, session tunables |
//! | `waystone` | host, update driver, terminal commands |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use waystone::prelude::*;
//!
//! # async fn run() -> Result<(), WaystoneError> {
//! // Register your factories, then:
//! let host = Host::builder()
//!     .settings_path("settings.json")
//!     .update_rate(30)
//!     .build()?;
//!
//! let mut out: Vec<String> = Vec::new();
//! host.execute("sessions list", &mut out).await;
//! host.shutdown().await
//! # }
//! ```

pub mod commands;
mod error;
mod host;
pub mod update;

pub use error::WaystoneError;
pub use host::{Host, HostBuilder};

pub use waystone_props as props;
pub use waystone_registry as registry;
pub use waystone_session as session;
pub use waystone_settings as settings;

/// Installs a `tracing` subscriber that prints to stderr.
///
/// The filter comes from `RUST_LOG`, falling back to `default_filter`
/// (e.g. `"info"` or `"waystone=debug"`). Does nothing if a global
/// subscriber is already installed.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Everything needed to implement sessions and drive a host.
pub mod prelude {
    pub use crate::commands::{
        Command, CommandOutput, CommandSet, PlayersCommand, RespawnCommand, SessionsCommand,
    };
    pub use crate::update::{UpdateConfig, UpdateDriver, update_sessions};
    pub use crate::{Host, HostBuilder, WaystoneError, init_tracing};

    pub use waystone_props::{
        EditablePropertyObject, PropertyBag, PropertyKey, PropertyObject, PropertyObjectExt,
        PropertyValue,
    };
    pub use waystone_registry::{
        BroadcastBus, CurrentChange, EventBus, EventRecord, EventSubscriber, FactoryRef, NullBus,
        Options, RegistryConfig, RegistryEvent, RemovalPolicy, SessionFactory, SessionRegistry,
    };
    pub use waystone_session::{
        DisposeFlag, Entities, HandoffPhase, HookFuture, NetSession, Player, PlayerId, PlayerRef,
        PlayerSlot, Session, SessionError, SessionEvents, SessionExt, SessionRef, Signal, State,
        Status, generate_session_id, when_finished,
    };
    pub use waystone_settings::{ClearPhysical, ConfigStore, RangeSetting, RenderEntity};
}
