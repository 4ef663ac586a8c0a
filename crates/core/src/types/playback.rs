//! Playback-related domain models

use crate::types::{Audiobook, Validator};
use serde::{Deserialize, Serialize};

/// Normalized transport state exposed to the rest of the application
///
/// Device-specific states (ready, ended, loading, ...) are folded into this
/// closed set by the session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerState {
    Playing,
    Paused,
    Buffering,
    Stopped,
    /// No session, or the device could not be queried
    None,
}

impl PlayerState {
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::None
    }
}

/// Playback rate, bounded to what audiobook listeners use in practice
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaybackRate(f32);

impl PlaybackRate {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 3.0;

    /// Creates a rate, rejecting values outside 0.5x - 3.0x
    pub fn new(rate: f32) -> Result<Self, String> {
        if !(Self::MIN..=Self::MAX).contains(&rate) {
            Err(format!(
                "Rate must be between {} and {}",
                Self::MIN,
                Self::MAX
            ))
        } else {
            Ok(Self(rate))
        }
    }

    /// Creates a rate, clamping into range; non-finite input becomes 1.0x
    pub fn clamped(rate: f32) -> Self {
        if rate.is_finite() {
            Self(rate.clamp(Self::MIN, Self::MAX))
        } else {
            Self::default()
        }
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self(1.0)
    }
}

impl Validator for PlaybackRate {
    fn validate(&self) -> Result<(), Vec<String>> {
        Self::new(self.0).map(|_| ()).map_err(|e| vec![e])
    }
}

/// The session layer's single view of current playback
///
/// Always replaced as a whole, never patched field by field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackSnapshot {
    pub is_playing: bool,
    pub position: f64,
    pub duration: f64,
    pub rate: f32,
    pub current_book: Option<Audiobook>,
}

impl PlaybackSnapshot {
    /// Fraction of the current part played, in 0.0..=1.0
    pub fn progress_fraction(&self) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.position / self.duration).clamp(0.0, 1.0)
    }
}
