//! Fixed-rate session update driver.
//!
//! Calls [`Session::update`](waystone_session::Session::update) on every
//! registered session at a fixed rate, on a background task.
//!
//! # Disabled mode
//!
//! When `rate_hz` is 0 no task is spawned: sessions that need updates
//! must be driven by hand with [`update_sessions`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, trace, warn};
use waystone_registry::SessionRegistry;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the update driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Updates per second. 0 = disabled.
    pub rate_hz: u32,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self { rate_hz: 30 }
    }
}

impl UpdateConfig {
    /// Maximum supported update rate.
    pub const MAX_RATE_HZ: u32 = 128;

    pub fn with_rate(rate_hz: u32) -> Self {
        Self { rate_hz }
    }

    /// Caps `rate_hz` to [`Self::MAX_RATE_HZ`].
    pub fn validated(mut self) -> Self {
        if self.rate_hz > Self::MAX_RATE_HZ {
            warn!(
                rate = self.rate_hz,
                max = Self::MAX_RATE_HZ,
                "update rate exceeds maximum, clamping"
            );
            self.rate_hz = Self::MAX_RATE_HZ;
        }
        self
    }

    /// Time between updates. `None` when disabled.
    pub fn period(&self) -> Option<Duration> {
        if self.rate_hz == 0 {
            None
        } else {
            Some(Duration::from_secs_f64(1.0 / self.rate_hz as f64))
        }
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Updates every session in `registry` once. Returns how many were updated.
///
/// Works on a snapshot, so sessions added or removed by an `update` call
/// take effect on the next pass.
pub fn update_sessions(registry: &SessionRegistry) -> usize {
    let sessions = registry.sessions();
    for session in &sessions {
        session.update();
    }
    sessions.len()
}

/// Handle to a running update task.
///
/// Dropping the handle stops the task too (its stop channel closes), but
/// [`stop`](Self::stop) also waits for the in-flight pass to finish.
#[derive(Debug)]
pub struct UpdateDriver {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    passes: Arc<AtomicU64>,
}

impl UpdateDriver {
    /// Spawns the update task on the current Tokio runtime.
    ///
    /// Returns `None` if the config is disabled (`rate_hz == 0`) or there
    /// is no runtime to spawn on.
    pub fn spawn(registry: SessionRegistry, config: UpdateConfig) -> Option<Self> {
        let config = config.validated();
        let Some(period) = config.period() else {
            debug!("update driver disabled (rate 0)");
            return None;
        };
        let Ok(runtime) = Handle::try_current() else {
            warn!(rate_hz = config.rate_hz, "no tokio runtime: update driver not started");
            return None;
        };

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let passes = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&passes);

        let task = runtime.spawn(async move {
            let mut interval = time::interval(period);
            // A slow pass delays the next one instead of triggering a burst.
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        let updated = update_sessions(&registry);
                        let pass = counter.fetch_add(1, Ordering::Relaxed) + 1;
                        trace!(pass, updated, "session update pass");
                    }
                }
            }
            debug!("update driver stopped");
        });

        debug!(
            rate_hz = config.rate_hz,
            period_ms = period.as_secs_f64() * 1000.0,
            "update driver started"
        );
        Some(Self {
            stop: Some(stop_tx),
            task,
            passes,
        })
    }

    /// Number of completed update passes.
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    /// Stops the task and waits for it to exit.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!(error = %e, "update task ended abnormally");
        }
    }
}
