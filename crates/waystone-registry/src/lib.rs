//! Session registry for Waystone.
//!
//! The registry is the single in-process authority over which sessions
//! exist and which one is **current**.
//!
//! # Key types
//!
//! - [`SessionRegistry`]: tracks sessions, runs the selection protocol
//! - [`SessionFactory`]: pluggable constructors, tried in registration order
//! - [`RegistryEvent`] / [`EventBus`]: process-wide notifications
//! - [`RegistryConfig`]: removal policy and optional handoff timeout
//!
//! # Selection protocol
//!
//! ```text
//! set_current(B)
//!   current := B              ← lookups already see B
//!   A.on_deselect(Some(B))    ← fully awaited
//!   B.on_select(Some(A))      ← fully awaited
//!   current_changed(A, B)     ← listeners notified
//!   A disposed + removed      ← only if A is dispose-on-change
//! ```

mod config;
mod events;
mod factory;
mod registry;

pub use config::{RegistryConfig, RemovalPolicy};
pub use events::{BroadcastBus, EventBus, EventRecord, EventSubscriber, NullBus, RegistryEvent, names};
pub use factory::{FactoryRef, Options, SessionFactory};
pub use registry::{CurrentChange, RegistrySignals, SessionRegistry};
