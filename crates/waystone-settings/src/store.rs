//! The JSON-backed key/value store.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::SettingsError;

/// Flat `key → JSON value` settings, optionally backed by a file.
///
/// Keys are dotted strings such as `settings.sessions.render_entity`;
/// they are stored as-is, not split into nested objects. All methods take
/// `&self`, so one store can be shared behind an `Arc`.
#[derive(Debug)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    values: RwLock<Map<String, Value>>,
}

impl ConfigStore {
    /// A store that lives only in memory. [`save`](Self::save) is a no-op.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: RwLock::new(Map::new()),
        }
    }

    /// Loads the store from `path`. A missing file gives an empty store
    /// that will be created on the first [`save`](Self::save).
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => parse(&path, &text)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file yet, starting empty");
                Map::new()
            }
            Err(source) => return Err(SettingsError::Io { path, source }),
        };
        debug!(path = %path.display(), keys = values.len(), "settings loaded");
        Ok(Self {
            path: Some(path),
            values: RwLock::new(values),
        })
    }

    /// The backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Reads `key` as `T`, or returns `default` when the key is missing or
    /// holds a value of another shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        let Some(value) = values.get(key) else {
            return default;
        };
        match serde_json::from_value(value.clone()) {
            Ok(v) => v,
            Err(e) => {
                warn!(key, error = %e, "setting has unexpected type, using default");
                default
            }
        }
    }

    /// Writes `key` in memory. Call [`save`](Self::save) to persist.
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<(), SettingsError> {
        let value = serde_json::to_value(value).map_err(|source| SettingsError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }

    /// Removes `key`. Returns whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Writes the store to its file as pretty-printed JSON, creating the
    /// parent directory if needed.
    pub fn save(&self) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let text = {
            let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
            serde_json::to_string_pretty(&*values).map_err(|source| SettingsError::Encode {
                key: "<root>".to_string(),
                source,
            })?
        };

        let io_err = |source| SettingsError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, text).map_err(io_err)?;
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }
}

fn parse(path: &Path, text: &str) -> Result<Map<String, Value>, SettingsError> {
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(SettingsError::NotAnObject(path.to_path_buf())),
        Err(source) => Err(SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        }),
    }
}
