//! Session readiness: a message, an optional progress, and a status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a session is in its startup.
///
/// ```text
///   Pending ──→ Ready
///      │
///      └──────→ Error
/// ```
///
/// "Finished" is not a status of its own: it's `Ready || Error`, see
/// [`Status::is_finished`]. Once finished, a session is not expected to go
/// back to `Pending` for the same attempt. That's a promise implementers
/// make; nothing here enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Still loading / connecting.
    #[default]
    Pending,
    /// Usable.
    Ready,
    /// Gave up.
    Error,
}

impl Status {
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }

    /// `Ready` or `Error`.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Ready => write!(f, "ready"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A snapshot of a session's readiness.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct State {
    /// Human-readable description ("Loading world", "Connection refused").
    pub message: String,
    /// Progress in `0.0..=1.0`, or `None` when progress doesn't apply.
    pub progress: Option<f32>,
    pub status: Status,
}

impl State {
    pub fn pending(message: impl Into<String>) -> Self {
        Self::with_status(Status::Pending, message)
    }

    pub fn ready(message: impl Into<String>) -> Self {
        Self::with_status(Status::Ready, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_status(Status::Error, message)
    }

    fn with_status(status: Status, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            progress: None,
            status,
        }
    }

    /// Sets the progress, clamped to `0.0..=1.0`. NaN means "no progress".
    pub fn with_progress(mut self, progress: f32) -> Self {
        self.progress = if progress.is_nan() {
            None
        } else {
            Some(progress.clamp(0.0, 1.0))
        };
        self
    }

    /// Progress as a plain float, with `-1.0` standing in for "not applicable".
    pub fn progress_or_sentinel(&self) -> f32 {
        self.progress.unwrap_or(-1.0)
    }

    pub fn is_ready(&self) -> bool {
        self.status.is_ready()
    }

    pub fn is_error(&self) -> bool {
        self.status.is_error()
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }
}
