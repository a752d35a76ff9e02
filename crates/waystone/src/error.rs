//! Unified error type for Waystone.

use waystone_session::SessionError;
use waystone_settings::SettingsError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `waystone` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WaystoneError {
    /// A session hook failed or timed out.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The settings file couldn't be read or written.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use waystone_session::HandoffPhase;

    #[test]
    fn test_from_session_error() {
        let err = SessionError::hook("local-1", HandoffPhase::Select, "scene missing");
        let waystone_err: WaystoneError = err.into();
        assert!(matches!(waystone_err, WaystoneError::Session(_)));
        assert!(waystone_err.to_string().contains("scene missing"));
    }

    #[test]
    fn test_from_settings_error() {
        let err = SettingsError::NotAnObject("settings.json".into());
        let waystone_err: WaystoneError = err.into();
        assert!(matches!(waystone_err, WaystoneError::Settings(_)));
        assert!(waystone_err.to_string().contains("settings.json"));
    }
}
