use std::path::PathBuf;

/// Errors from loading or saving a [`ConfigStore`](crate::ConfigStore).
///
/// Reading a key never fails: a missing or mistyped value falls back to
/// the caller's default.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file parsed, but its top level isn't a JSON object.
    #[error("settings file {0} must contain a JSON object")]
    NotAnObject(PathBuf),

    #[error("failed to encode setting {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
