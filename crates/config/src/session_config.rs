//! Playback session configuration section

use crate::validation::{Checks, ConfigSection};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Timing of the playback session's background work
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// How often playback state is polled from the device, in milliseconds
    pub poll_interval_ms: u64,

    /// How often progress is written to the library, in seconds
    pub autosave_interval_secs: u64,

    /// Sleep timer countdown resolution in milliseconds
    pub sleep_timer_tick_ms: u64,

    /// Attempts made to load a book before giving up (device re-initialised in between)
    pub load_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            autosave_interval_secs: 10,
            sleep_timer_tick_ms: 1000,
            load_attempts: 2,
        }
    }
}

impl SessionConfig {
    pub const POLL_INTERVAL_MS: RangeInclusive<u64> = 50..=5_000;
    pub const AUTOSAVE_INTERVAL_SECS: RangeInclusive<u64> = 1..=300;
    pub const SLEEP_TIMER_TICK_MS: RangeInclusive<u64> = 100..=10_000;
    pub const LOAD_ATTEMPTS: RangeInclusive<u32> = 1..=5;

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn sleep_timer_tick(&self) -> Duration {
        Duration::from_millis(self.sleep_timer_tick_ms)
    }
}

impl ConfigSection for SessionConfig {
    const TABLE: &'static str = "session";

    fn check(&self, checks: &mut Checks) {
        checks
            .within("poll_interval_ms", self.poll_interval_ms, Self::POLL_INTERVAL_MS)
            .within(
                "autosave_interval_secs",
                self.autosave_interval_secs,
                Self::AUTOSAVE_INTERVAL_SECS,
            )
            .within(
                "sleep_timer_tick_ms",
                self.sleep_timer_tick_ms,
                Self::SLEEP_TIMER_TICK_MS,
            )
            .within("load_attempts", self.load_attempts, Self::LOAD_ATTEMPTS);

        // Saving more often than polling would only rewrite the same position
        checks.ensure(
            "autosave_interval_secs",
            self.autosave_interval() >= self.poll_interval(),
            "must not be shorter than the poll interval",
        );
    }
}
