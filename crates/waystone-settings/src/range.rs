//! Bounded numeric tunables.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::{ConfigStore, SettingsError};

/// Unit shown next to a tunable's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Metres,
    Seconds,
}

impl Unit {
    /// Localisation key of the value label.
    pub fn value_key(self) -> &'static str {
        match self {
            Self::Metres => "settings.range.value.meters",
            Self::Seconds => "settings.range.value.seconds",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metres => write!(f, "m"),
            Self::Seconds => write!(f, "s"),
        }
    }
}

/// A numeric setting with a range and a step, stored under a fixed key.
///
/// Writes go through [`write`](Self::write), which clamps the value to
/// `MIN..=MAX`, snaps it to the nearest step from `MIN`, stores it and
/// saves the store. Reads never fail: a missing or mistyped value gives
/// `DEFAULT`.
pub trait RangeSetting {
    /// How the value is stored.
    type Value: Serialize + DeserializeOwned + Copy;

    /// Store key.
    const KEY: &'static str;
    /// Location in a settings menu, e.g. `["sessions", "visual", "render_entity"]`.
    const PATH: &'static [&'static str];
    const DEFAULT: Self::Value;
    const MIN: f32;
    const MAX: f32;
    const STEP: f32;
    const UNIT: Unit;

    fn to_stored(value: f32) -> Self::Value;
    fn to_f32(value: Self::Value) -> f32;

    /// Localisation key of the setting's label.
    fn label_key() -> String {
        format!("settings.entry.{}.label", Self::PATH.join("."))
    }

    /// Clamps to the range and snaps to the step. Non-finite input gives
    /// the default.
    fn normalize(value: f32) -> Self::Value {
        if !value.is_finite() {
            warn!(key = Self::KEY, value, "non-finite setting value, using default");
            return Self::DEFAULT;
        }
        let clamped = value.clamp(Self::MIN, Self::MAX);
        if clamped != value {
            warn!(
                key = Self::KEY,
                value,
                min = Self::MIN,
                max = Self::MAX,
                "setting out of range, clamping"
            );
        }
        let steps = ((clamped - Self::MIN) / Self::STEP).round();
        let snapped = (Self::MIN + steps * Self::STEP).clamp(Self::MIN, Self::MAX);
        Self::to_stored(snapped)
    }

    /// Current value from `store`.
    fn read(store: &ConfigStore) -> Self::Value {
        store.get(Self::KEY, Self::DEFAULT)
    }

    /// Normalizes `value`, stores it and saves `store`. Returns what was
    /// stored.
    fn write(store: &ConfigStore, value: f32) -> Result<Self::Value, SettingsError> {
        let stored = Self::normalize(value);
        store.set(Self::KEY, stored)?;
        store.save()?;
        Ok(stored)
    }

    /// Drops any stored value so reads return `DEFAULT` again.
    fn reset(store: &ConfigStore) -> Result<(), SettingsError> {
        if store.remove(Self::KEY) {
            store.save()?;
        }
        Ok(())
    }
}

/// Distance, in metres, within which remote entities are rendered.
#[derive(Debug, Clone, Copy)]
pub struct RenderEntity;

impl RangeSetting for RenderEntity {
    type Value = f32;

    const KEY: &'static str = "settings.sessions.render_entity";
    const PATH: &'static [&'static str] = &["sessions", "visual", "render_entity"];
    const DEFAULT: f32 = 100.0;
    const MIN: f32 = 5.0;
    const MAX: f32 = 200.0;
    const STEP: f32 = 0.1;
    const UNIT: Unit = Unit::Metres;

    fn to_stored(value: f32) -> f32 {
        // Keep one decimal so the file doesn't collect float noise.
        (value * 10.0).round() / 10.0
    }

    fn to_f32(value: f32) -> f32 {
        value
    }
}

/// Seconds after which physical objects left behind are cleared.
#[derive(Debug, Clone, Copy)]
pub struct ClearPhysical;

impl RangeSetting for ClearPhysical {
    type Value = i32;

    const KEY: &'static str = "settings.sessions.clear_physical";
    const PATH: &'static [&'static str] = &["sessions", "visual", "clear_physical"];
    const DEFAULT: i32 = 15;
    const MIN: f32 = 0.0;
    const MAX: f32 = 30.0;
    const STEP: f32 = 1.0;
    const UNIT: Unit = Unit::Seconds;

    fn to_stored(value: f32) -> i32 {
        value.round() as i32
    }

    fn to_f32(value: i32) -> f32 {
        value as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_entity_normalize_clamps_and_snaps() {
        assert_eq!(RenderEntity::normalize(250.0), 200.0);
        assert_eq!(RenderEntity::normalize(1.0), 5.0);
        assert_eq!(RenderEntity::normalize(42.34), 42.3);
        assert_eq!(RenderEntity::normalize(f32::NAN), 100.0);
    }

    #[test]
    fn test_clear_physical_normalize_rounds_to_whole_seconds() {
        assert_eq!(ClearPhysical::normalize(12.6), 13);
        assert_eq!(ClearPhysical::normalize(-4.0), 0);
        assert_eq!(ClearPhysical::normalize(99.0), 30);
    }

    #[test]
    fn test_label_key_joins_path() {
        assert_eq!(
            RenderEntity::label_key(),
            "settings.entry.sessions.visual.render_entity.label"
        );
        assert_eq!(ClearPhysical::UNIT.value_key(), "settings.range.value.seconds");
    }

    #[test]
    fn test_read_defaults_when_unset() {
        let store = ConfigStore::in_memory();
        assert_eq!(RenderEntity::read(&store), 100.0);
        assert_eq!(ClearPhysical::read(&store), 15);
    }

    #[test]
    fn test_write_then_reset_restores_default() {
        let store = ConfigStore::in_memory();
        assert_eq!(ClearPhysical::write(&store, 20.0).unwrap(), 20);
        assert_eq!(ClearPhysical::read(&store), 20);

        ClearPhysical::reset(&store).unwrap();
        assert_eq!(ClearPhysical::read(&store), 15);
    }
}
