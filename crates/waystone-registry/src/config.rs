//! Registry configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What `remove` does when the session being removed is current.
///
/// In both cases the registry first picks a replacement (any other
/// session, or none) and points `current` at it. The policies differ in
/// when the replacement's handoff runs relative to the removal:
///
/// ```text
/// Detached:  current := R ─┬─→ session removed, `session_removed` fires
///                          └─→ (spawned) deselect old, select R, notify
///
/// Awaited:   current := R ──→ deselect old, select R, notify
///                          ──→ session removed, `session_removed` fires
/// ```
///
/// `Detached` never suspends the caller, but the handoff races with the
/// removal: listeners of `session_removed` may run before the handoff
/// finishes. `Awaited` orders everything, and a failing hook makes
/// `remove` return the error (the session then stays registered).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Spawn the promotion handoff and remove immediately.
    #[default]
    Detached,
    /// Await the promotion handoff, then remove.
    Awaited,
}

/// Configuration for a [`SessionRegistry`](crate::SessionRegistry).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// See [`RemovalPolicy`].
    pub removal: RemovalPolicy,

    /// Upper bound for each select/deselect/dispose hook.
    ///
    /// `None` (the default) trusts hooks to finish. When set, a hook that
    /// runs longer fails with
    /// [`SessionError::TimedOut`](waystone_session::SessionError::TimedOut).
    /// Like any hook failure, a timeout does not roll back `current`.
    pub handoff_timeout: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_config_default() {
        let config = RegistryConfig::default();
        assert_eq!(config.removal, RemovalPolicy::Detached);
        assert!(config.handoff_timeout.is_none());
    }
}
