// FILE: crates/session/src/device.rs

//! Media-session device seam
//!
//! The device is the platform's playback service: a queue of tracks, a
//! transport, and the OS now-playing surface. Everything here is owned by
//! [`crate::PlaybackController`]; nothing else talks to a device directly.

use crate::error::DeviceResult;
use async_trait::async_trait;

/// Raw transport state as reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceState {
    None,
    Ready,
    Playing,
    Paused,
    Stopped,
    Ended,
    Buffering,
    Loading,
    Connecting,
    Error,
}

impl DeviceState {
    /// Every state, for exhaustive checks
    pub const ALL: [DeviceState; 10] = [
        DeviceState::None,
        DeviceState::Ready,
        DeviceState::Playing,
        DeviceState::Paused,
        DeviceState::Stopped,
        DeviceState::Ended,
        DeviceState::Buffering,
        DeviceState::Loading,
        DeviceState::Connecting,
        DeviceState::Error,
    ];
}

/// Now-playing metadata shown by the OS
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NowPlaying {
    pub title: String,
    pub artist: Option<String>,
    pub artwork: Option<String>,
    pub duration: Option<f64>,
}

/// One queue entry
#[derive(Debug, Clone, PartialEq)]
pub struct QueueTrack {
    /// Stable id, used to map the active track back to a part
    pub id: String,
    pub uri: String,
    pub metadata: NowPlaying,
}

/// A platform media-session service
#[async_trait]
pub trait MediaDevice: Send + Sync {
    /// Sets up (or re-creates) the underlying session
    async fn initialize(&self) -> DeviceResult<()>;

    /// Stops playback and clears the queue
    async fn reset(&self) -> DeviceResult<()>;

    /// Replaces the queue; the first entry becomes active at position 0
    async fn set_queue(&self, tracks: Vec<QueueTrack>) -> DeviceResult<()>;

    /// Makes queue entry `index` active at `position` seconds, as one operation
    async fn skip_to(&self, index: usize, position: f64) -> DeviceResult<()>;

    async fn play(&self) -> DeviceResult<()>;

    async fn pause(&self) -> DeviceResult<()>;

    /// Seeks within the active entry
    async fn seek_to(&self, position: f64) -> DeviceResult<()>;

    /// Seeks relative to the current position
    async fn seek_by(&self, offset: f64) -> DeviceResult<()>;

    async fn set_rate(&self, rate: f32) -> DeviceResult<()>;

    async fn rate(&self) -> DeviceResult<f32>;

    /// Position within the active entry, in seconds
    async fn position(&self) -> DeviceResult<f64>;

    /// Duration of the active entry, in seconds
    async fn duration(&self) -> DeviceResult<f64>;

    async fn state(&self) -> DeviceResult<DeviceState>;

    /// Id of the active queue entry, if any
    async fn active_track_id(&self) -> DeviceResult<Option<String>>;

    /// Replaces the now-playing metadata of queue entry `index`
    async fn update_metadata(&self, index: usize, metadata: NowPlaying) -> DeviceResult<()>;
}
