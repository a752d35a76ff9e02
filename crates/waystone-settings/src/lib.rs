//! Settings for Waystone sessions.
//!
//! Two pieces:
//!
//! - [`ConfigStore`]: flat string keys mapped to JSON values, persisted
//!   to a single JSON file.
//! - [`RangeSetting`]: a bounded numeric tunable stored in a
//!   `ConfigStore`. [`RenderEntity`] and [`ClearPhysical`] are the two
//!   tunables the session layer reads.
//!
//! ```rust,ignore
//! let store = ConfigStore::load("settings.json")?;
//! let metres = RenderEntity::read(&store);
//! RenderEntity::write(&store, 250.0)?; // clamped to 200.0 and saved
//! ```

mod error;
mod range;
mod store;

pub use error::SettingsError;
pub use range::{ClearPhysical, RangeSetting, RenderEntity, Unit};
pub use store::ConfigStore;
