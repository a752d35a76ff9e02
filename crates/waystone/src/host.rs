//! `Host` builder and lifecycle.
//!
//! This is the entry point for an application embedding Waystone. It ties
//! together all the layers: settings → registry → update driver →
//! commands.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use waystone_registry::{
    BroadcastBus, EventSubscriber, FactoryRef, Options, RegistryConfig, RemovalPolicy,
    SessionRegistry,
};
use waystone_session::SessionRef;
use waystone_settings::{ClearPhysical, ConfigStore, RangeSetting, RenderEntity};

use crate::WaystoneError;
use crate::commands::{CommandOutput, CommandSet};
use crate::update::{UpdateConfig, UpdateDriver};

/// Builder for configuring and starting a [`Host`].
///
/// # Example
///
/// ```rust,ignore
/// use waystone::prelude::*;
///
/// let host = Host::builder()
///     .settings_path("settings.json")
///     .factory(Arc::new(LocalFactory))
///     .update_rate(30)
///     .build()?;
/// host.create_session("local", &Options::new());
/// ```
pub struct HostBuilder {
    registry: RegistryConfig,
    bus_capacity: usize,
    settings_path: Option<PathBuf>,
    update: UpdateConfig,
    command_prefix: String,
    factories: Vec<FactoryRef>,
}

impl HostBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            registry: RegistryConfig::default(),
            bus_capacity: BroadcastBus::DEFAULT_CAPACITY,
            settings_path: None,
            update: UpdateConfig::default(),
            command_prefix: String::new(),
            factories: Vec::new(),
        }
    }

    /// Sets the whole registry configuration.
    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry = config;
        self
    }

    pub fn removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.registry.removal = policy;
        self
    }

    /// Bounds every select/deselect/dispose hook.
    pub fn handoff_timeout(mut self, timeout: Duration) -> Self {
        self.registry.handoff_timeout = Some(timeout);
        self
    }

    /// Events buffered per bus subscriber before the oldest are dropped.
    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    /// Persists settings to this JSON file. Without it, settings live in
    /// memory only.
    pub fn settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// Session update rate in Hz. 0 disables the update driver.
    pub fn update_rate(mut self, rate_hz: u32) -> Self {
        self.update = UpdateConfig::with_rate(rate_hz);
        self
    }

    /// Prefix for terminal commands, e.g. `"/"`. Empty by default.
    pub fn command_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.command_prefix = prefix.into();
        self
    }

    /// Registers a factory when the host starts.
    pub fn factory(mut self, factory: FactoryRef) -> Self {
        self.factories.push(factory);
        self
    }

    /// Loads settings, creates the registry, registers factories and
    /// starts the update driver.
    ///
    /// Outside a Tokio runtime the update driver is skipped with a warning.
    pub fn build(self) -> Result<Host, WaystoneError> {
        let settings = match &self.settings_path {
            Some(path) => ConfigStore::load(path)?,
            None => ConfigStore::in_memory(),
        };

        let bus = Arc::new(BroadcastBus::new(self.bus_capacity));
        let registry = SessionRegistry::new(self.registry, bus.clone());
        for factory in self.factories {
            registry.register(factory);
        }
        let driver = UpdateDriver::spawn(registry.clone(), self.update);

        tracing::info!(
            factories = registry.factories().len(),
            update_rate_hz = self.update.rate_hz,
            render_entity = RenderEntity::read(&settings),
            clear_physical = ClearPhysical::read(&settings),
            "waystone host started"
        );

        Ok(Host {
            registry,
            bus,
            settings: Arc::new(settings),
            commands: CommandSet::standard(self.command_prefix),
            driver,
        })
    }
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Waystone host.
///
/// Owns the registry, the event bus, the settings store and the update
/// driver. Call [`shutdown`](Self::shutdown) to tear everything down.
#[derive(Debug)]
pub struct Host {
    registry: SessionRegistry,
    bus: Arc<BroadcastBus>,
    settings: Arc<ConfigStore>,
    commands: CommandSet,
    driver: Option<UpdateDriver>,
}

impl Host {
    /// Creates a new builder.
    pub fn builder() -> HostBuilder {
        HostBuilder::new()
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn bus(&self) -> &Arc<BroadcastBus> {
        &self.bus
    }

    /// Subscribes to every registry event.
    pub fn subscribe(&self) -> EventSubscriber {
        self.bus.subscribe()
    }

    pub fn settings(&self) -> &Arc<ConfigStore> {
        &self.settings
    }

    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    /// Completed update passes, or `None` if the driver is disabled.
    pub fn update_passes(&self) -> Option<u64> {
        self.driver.as_ref().map(UpdateDriver::passes)
    }

    /// Asks the registered factories for a session of kind `name`.
    pub fn create_session(&self, name: &str, options: &Options) -> Option<SessionRef> {
        self.registry.try_make(name, options)
    }

    /// Runs a terminal command line. `false` if no command recognised it.
    pub async fn execute(&self, input: &str, out: &mut dyn CommandOutput) -> bool {
        self.commands.execute(&self.registry, input, out).await
    }

    /// Completions for a partially typed command line.
    pub fn complete(&self, input: &str) -> Vec<String> {
        self.commands.complete(&self.registry, input)
    }

    /// Distance within which remote entities are rendered, in metres.
    pub fn render_entity_distance(&self) -> f32 {
        RenderEntity::to_f32(RenderEntity::read(&self.settings))
    }

    /// Delay before physical leftovers are cleared.
    pub fn clear_physical_after(&self) -> Duration {
        let seconds = ClearPhysical::read(&self.settings);
        Duration::from_secs(u64::try_from(seconds).unwrap_or(0))
    }

    /// Closes every session, unregisters every factory, stops the update
    /// driver and saves settings.
    ///
    /// The driver is stopped and settings are saved even when closing a
    /// session fails; that failure is then returned.
    pub async fn shutdown(mut self) -> Result<(), WaystoneError> {
        let closed = self.registry.shutdown().await;
        if let Some(driver) = self.driver.take() {
            driver.stop().await;
        }
        self.settings.save()?;
        closed?;
        tracing::info!("waystone host shut down");
        Ok(())
    }
}
