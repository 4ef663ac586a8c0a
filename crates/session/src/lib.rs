//! Earmark playback session
//!
//! The session layer between the library and the platform's media service:
//!
//! - [`PlaybackController`] owns the [`MediaDevice`] and turns a logical
//!   audiobook into queue operations
//! - [`SessionAggregator`] polls the device, publishes [`PlaybackSnapshot`]s
//!   and persists listening progress
//! - [`SleepTimer`] pauses playback at a wall-clock deadline
//! - [`RemoteControlHandler`] serves OS transport commands without a UI
//!
//! [`PlaybackSnapshot`]: earmark_core::PlaybackSnapshot

pub mod aggregator;
pub mod clock;
pub mod controller;
pub mod device;
pub mod error;
pub mod remote;
pub mod sleep_timer;

pub use aggregator::SessionAggregator;
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{map_device_state, parse_track_id, part_track_id, PlaybackController};
pub use device::{DeviceState, MediaDevice, NowPlaying, QueueTrack};
pub use error::{DeviceError, DeviceResult, SessionError, SessionResult};
pub use remote::{RemoteCommand, RemoteControlHandler};
pub use sleep_timer::{SleepTimer, TimerAction};
