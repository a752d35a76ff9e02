//! Error types for the session layer.

use std::fmt;
use std::time::Duration;

/// Which lifecycle hook of a session was running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandoffPhase {
    /// `on_select`: the session is becoming current.
    Select,
    /// `on_deselect`: the session is no longer current.
    Deselect,
    /// `dispose`: the session is being torn down.
    Dispose,
}

impl fmt::Display for HandoffPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "select"),
            Self::Deselect => write!(f, "deselect"),
            Self::Dispose => write!(f, "dispose"),
        }
    }
}

/// Errors raised by session implementations (and surfaced by the
/// registry when it drives them).
///
/// "Not found" is deliberately absent: looking up a missing session is a
/// normal outcome and is reported as `Option`/`bool`, never as an error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// A select/deselect/dispose hook failed.
    #[error("session {id} failed to {phase}: {reason}")]
    Hook {
        id: String,
        phase: HandoffPhase,
        reason: String,
    },

    /// A hook didn't complete within the registry's configured timeout.
    /// Only possible when `handoff_timeout` is set.
    #[error("session {id} did not {phase} within {after:?}")]
    TimedOut {
        id: String,
        phase: HandoffPhase,
        after: Duration,
    },

    /// The session was already disposed.
    #[error("session {0} is disposed")]
    Disposed(String),

    /// A networked operation was attempted while offline.
    #[error("session {0} is not connected")]
    NotConnected(String),
}

impl SessionError {
    /// Shorthand for [`SessionError::Hook`].
    pub fn hook(id: impl Into<String>, phase: HandoffPhase, reason: impl Into<String>) -> Self {
        Self::Hook {
            id: id.into(),
            phase,
            reason: reason.into(),
        }
    }
}
