//! The virtual clock every timed behavior in the simulator reads from.
//!
//! Nothing in the workspace consults wall-clock time. The clock starts at a
//! configured epoch and only moves when a control-plane call advances it, so
//! expiry checks and delayed state transitions are a pure function of
//! explicitly injected time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::config::ClockConfig;
use crate::error::AppError;
use crate::result::AppResult;

/// Injectable monotonic time source.
///
/// Internally the elapsed virtual time is a millisecond counter, which keeps
/// reads lock-free and `advance` a single atomic add. Two reads without an
/// intervening advance always observe the same instant.
#[derive(Debug)]
pub struct VirtualClock {
    /// The instant the simulated world began.
    epoch: DateTime<Utc>,
    /// Milliseconds elapsed since the epoch.
    elapsed_ms: AtomicU64,
}

impl VirtualClock {
    /// Creates a clock starting at the given epoch.
    pub fn new(epoch: DateTime<Utc>) -> Self {
        Self {
            epoch,
            elapsed_ms: AtomicU64::new(0),
        }
    }

    /// Creates a clock from configuration, parsing the epoch timestamp.
    pub fn from_config(config: &ClockConfig) -> AppResult<Self> {
        let epoch = DateTime::parse_from_rfc3339(&config.epoch)
            .map_err(|e| {
                AppError::configuration(format!("invalid clock epoch '{}': {e}", config.epoch))
            })?
            .with_timezone(&Utc);
        Ok(Self::new(epoch))
    }

    /// The epoch the clock started from.
    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// The current virtual instant.
    pub fn now(&self) -> DateTime<Utc> {
        let elapsed = self.elapsed_ms.load(Ordering::SeqCst);
        self.epoch + TimeDelta::milliseconds(elapsed as i64)
    }

    /// Advances the clock by the given duration and returns the new instant.
    pub fn advance(&self, duration: Duration) -> DateTime<Utc> {
        let millis = duration.as_millis() as u64;
        let elapsed = self.elapsed_ms.fetch_add(millis, Ordering::SeqCst) + millis;
        let now = self.epoch + TimeDelta::milliseconds(elapsed as i64);
        tracing::debug!(advanced_ms = millis, now = %now, "Virtual clock advanced");
        now
    }

    /// Advances the clock by a fractional number of seconds, as received
    /// from the control-plane surface.
    pub fn advance_seconds(&self, seconds: f64) -> AppResult<DateTime<Utc>> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(AppError::validation(format!(
                "cannot advance clock by {seconds} seconds"
            )));
        }
        Ok(self.advance(Duration::from_secs_f64(seconds)))
    }
}
