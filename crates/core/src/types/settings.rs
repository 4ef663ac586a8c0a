//! Persisted listener preferences

use crate::types::{PlaybackRate, Validator};
use serde::{Deserialize, Serialize};

/// Listener preferences stored alongside the library
///
/// Every field has a default so partially stored or older documents load
/// cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds jumped by "skip forward"
    pub skip_forward_seconds: u32,
    /// Seconds jumped by "skip backward"
    pub skip_backward_seconds: u32,
    /// Preferred playback rate
    pub playback_rate: f32,
    /// Last sleep timer duration picked, offered as the default next time
    pub sleep_timer_minutes: Option<u32>,
    /// Seconds rewound when resuming a paused book
    pub auto_rewind_seconds: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            skip_forward_seconds: 30,
            skip_backward_seconds: 15,
            playback_rate: 1.0,
            sleep_timer_minutes: None,
            auto_rewind_seconds: 0,
        }
    }
}

impl Settings {
    /// Merges a partial update over these settings
    pub fn merge(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.skip_forward_seconds {
            self.skip_forward_seconds = v;
        }
        if let Some(v) = patch.skip_backward_seconds {
            self.skip_backward_seconds = v;
        }
        if let Some(v) = patch.playback_rate {
            self.playback_rate = PlaybackRate::clamped(v).value();
        }
        if let Some(v) = patch.sleep_timer_minutes {
            self.sleep_timer_minutes = v;
        }
        if let Some(v) = patch.auto_rewind_seconds {
            self.auto_rewind_seconds = v;
        }
    }
}

impl Validator for Settings {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.skip_forward_seconds == 0 || self.skip_forward_seconds > 600 {
            errors.push("Skip forward must be between 1 and 600 seconds".to_string());
        }

        if self.skip_backward_seconds == 0 || self.skip_backward_seconds > 600 {
            errors.push("Skip backward must be between 1 and 600 seconds".to_string());
        }

        if let Err(rate_errors) = PlaybackRate::new(self.playback_rate) {
            errors.push(rate_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Partial settings update; `None` fields keep their stored value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    pub skip_forward_seconds: Option<u32>,
    pub skip_backward_seconds: Option<u32>,
    pub playback_rate: Option<f32>,
    pub sleep_timer_minutes: Option<Option<u32>>,
    pub auto_rewind_seconds: Option<u32>,
}
