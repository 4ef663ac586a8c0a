// FILE: crates/session/src/controller.rs

//! Playback session controller
//!
//! Translates a logical audiobook into device queue operations and exposes a
//! failure-isolated transport. Only [`PlaybackController::load_audiobook`]
//! reports errors; every other call logs device failures and carries on.

use crate::device::{DeviceState, MediaDevice, NowPlaying, QueueTrack};
use crate::error::{SessionError, SessionResult};
use earmark_config::SessionConfig;
use earmark_core::{Audiobook, BookId, PlayerState};
use earmark_resilience::{with_retry_async, RetryPolicy};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

const PART_SEPARATOR: &str = "::part::";

/// Queue id of one part of a multi-part book
pub fn part_track_id(book_id: BookId, index: usize) -> String {
    format!("{}{}{}", book_id, PART_SEPARATOR, index)
}

/// Maps a queue id back to its book and part index
///
/// Single-file books use the bare book id, which maps to part 0.
pub fn parse_track_id(id: &str) -> Option<(BookId, usize)> {
    match id.split_once(PART_SEPARATOR) {
        Some((book, index)) => Some((book.parse().ok()?, index.parse().ok()?)),
        None => Some((id.parse().ok()?, 0)),
    }
}

/// Folds raw device states into the application's closed set
pub fn map_device_state(state: DeviceState) -> PlayerState {
    match state {
        DeviceState::Playing => PlayerState::Playing,
        DeviceState::Paused
        | DeviceState::Ready
        | DeviceState::Stopped
        | DeviceState::Ended
        | DeviceState::None => PlayerState::Paused,
        DeviceState::Buffering | DeviceState::Loading | DeviceState::Connecting => {
            PlayerState::Buffering
        }
        DeviceState::Error => PlayerState::Stopped,
    }
}

fn now_playing(book: &Audiobook, index: usize) -> NowPlaying {
    let duration = match &book.parts {
        Some(parts) if book.is_multi_part() => parts.get(index).and_then(|p| p.duration_seconds),
        _ => book.total_duration_seconds,
    };

    NowPlaying {
        title: book.title.clone(),
        artist: book.author.clone(),
        artwork: book.artwork_uri.clone(),
        duration,
    }
}

fn queue_for(book: &Audiobook) -> Vec<QueueTrack> {
    match &book.parts {
        Some(parts) if book.is_multi_part() => parts
            .iter()
            .enumerate()
            .map(|(index, part)| QueueTrack {
                id: part_track_id(book.id, index),
                uri: part.uri.clone(),
                metadata: now_playing(book, index),
            })
            .collect(),
        _ => vec![QueueTrack {
            id: book.id.to_string(),
            uri: book.current_uri().to_string(),
            metadata: now_playing(book, 0),
        }],
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LoadedBook {
    id: BookId,
    part_count: usize,
}

/// Sole owner of the media-session device
pub struct PlaybackController {
    device: Arc<dyn MediaDevice>,
    retry: RetryPolicy,
    load_lock: Mutex<()>,
    loaded: RwLock<Option<LoadedBook>>,
}

impl PlaybackController {
    /// Creates a controller that retries a failed load once
    pub fn new(device: Arc<dyn MediaDevice>) -> Self {
        Self::with_load_attempts(device, 2)
    }

    pub fn from_config(device: Arc<dyn MediaDevice>, config: &SessionConfig) -> Self {
        Self::with_load_attempts(device, config.load_attempts)
    }

    /// Creates a controller making up to `attempts` load attempts
    pub fn with_load_attempts(device: Arc<dyn MediaDevice>, attempts: u32) -> Self {
        let retry = RetryPolicy::new(attempts.max(1) as usize)
            .with_initial_delay(Duration::ZERO)
            .with_jitter(false);

        Self {
            device,
            retry,
            load_lock: Mutex::new(()),
            loaded: RwLock::new(None),
        }
    }

    /// Sets up the device session
    pub async fn initialize(&self) -> SessionResult<()> {
        self.device.initialize().await?;
        log::info!("Playback device initialized");
        Ok(())
    }

    async fn reinitialize(&self) {
        log::warn!("Re-initializing playback device");
        if let Err(e) = self.device.initialize().await {
            log::error!("Playback device re-initialization failed: {}", e);
        }
    }

    /// Loads `book` and positions it at its saved part and offset
    ///
    /// Nothing is played. On device failure the device is re-initialized
    /// and the whole load retried; if that fails too the error is returned.
    pub async fn load_audiobook(&self, book: &Audiobook) -> SessionResult<()> {
        if book.current_uri().trim().is_empty() {
            return Err(SessionError::NothingToPlay(book.id));
        }

        let _guard = self.load_lock.lock().await;
        *self.loaded.write().await = None;

        with_retry_async(&self.retry, || self.try_load(book), || self.reinitialize()).await?;

        *self.loaded.write().await = Some(LoadedBook {
            id: book.id,
            part_count: book.part_count(),
        });

        self.mirror_metadata(book, book.resolved_part_index()).await;
        log::info!("Loaded \"{}\" ({})", book.title, book.id);
        Ok(())
    }

    async fn try_load(&self, book: &Audiobook) -> crate::error::DeviceResult<()> {
        self.device.reset().await?;
        self.device.set_queue(queue_for(book)).await?;

        let position = book.current_position_seconds.max(0.0);
        if book.is_multi_part() {
            self.device
                .skip_to(book.resolved_part_index(), position)
                .await?;
        } else if position > 0.0 {
            self.device.seek_to(position).await?;
        }

        Ok(())
    }

    async fn mirror_metadata(&self, book: &Audiobook, index: usize) {
        if let Err(e) = self
            .device
            .update_metadata(index, now_playing(book, index))
            .await
        {
            log::warn!("Failed to update now-playing metadata: {}", e);
        }
    }

    pub async fn play(&self) {
        if let Err(e) = self.device.play().await {
            log::warn!("play failed: {}", e);
        }
    }

    pub async fn pause(&self) {
        if let Err(e) = self.device.pause().await {
            log::warn!("pause failed: {}", e);
        }
    }

    pub async fn seek_to(&self, seconds: f64) {
        if let Err(e) = self.device.seek_to(seconds.max(0.0)).await {
            log::warn!("seek_to({}) failed: {}", seconds, e);
        }
    }

    pub async fn seek_by(&self, offset: f64) {
        if let Err(e) = self.device.seek_by(offset).await {
            log::warn!("seek_by({}) failed: {}", offset, e);
        }
    }

    pub async fn skip_forward(&self, seconds: f64) {
        self.seek_by(seconds.abs()).await;
    }

    /// Jumps back, never past the start of the current part
    pub async fn skip_backward(&self, seconds: f64) {
        let position = self.get_position().await;
        self.seek_to((position - seconds.abs()).max(0.0)).await;
    }

    pub async fn set_rate(&self, rate: f32) {
        if let Err(e) = self.device.set_rate(rate).await {
            log::warn!("set_rate({}) failed: {}", rate, e);
        }
    }

    /// Stops playback and unloads the book
    ///
    /// Returns the position held just before stopping, if it was positive,
    /// so the caller can persist it.
    pub async fn stop(&self) -> Option<f64> {
        let position = self.get_position().await;

        if let Err(e) = self.device.reset().await {
            log::warn!("stop failed: {}", e);
        }
        *self.loaded.write().await = None;

        (position > 0.0).then_some(position)
    }

    pub async fn get_position(&self) -> f64 {
        self.device.position().await.unwrap_or_else(|e| {
            log::debug!("position query failed: {}", e);
            0.0
        })
    }

    pub async fn get_duration(&self) -> f64 {
        self.device.duration().await.unwrap_or_else(|e| {
            log::debug!("duration query failed: {}", e);
            0.0
        })
    }

    pub async fn get_rate(&self) -> f32 {
        self.device.rate().await.unwrap_or_else(|e| {
            log::debug!("rate query failed: {}", e);
            1.0
        })
    }

    /// Current transport state; a failing query reads as [`PlayerState::None`]
    pub async fn get_state(&self) -> PlayerState {
        match self.device.state().await {
            Ok(state) => map_device_state(state),
            Err(e) => {
                log::debug!("state query failed: {}", e);
                PlayerState::None
            }
        }
    }

    /// Id of the book currently loaded on the device
    pub async fn loaded_book_id(&self) -> Option<BookId> {
        self.loaded.read().await.map(|b| b.id)
    }

    /// Part index of the active queue entry within the loaded book
    pub async fn current_part_index(&self) -> Option<usize> {
        let loaded = (*self.loaded.read().await)?;

        let track_id = match self.device.active_track_id().await {
            Ok(id) => id?,
            Err(e) => {
                log::debug!("active track query failed: {}", e);
                return None;
            }
        };

        match parse_track_id(&track_id) {
            Some((id, index)) if id == loaded.id && index < loaded.part_count => Some(index),
            _ => None,
        }
    }

    /// Re-mirrors title, author and artwork of `book` if it is loaded
    pub async fn update_current_track_artwork(&self, book: &Audiobook) {
        if self.loaded_book_id().await != Some(book.id) {
            return;
        }

        let index = match self.current_part_index().await {
            Some(index) => index,
            None => book.resolved_part_index(),
        };
        self.mirror_metadata(book, index).await;
    }

    /// Re-mirrors metadata of the loaded book from a fresh library listing
    pub async fn sync_artwork_from_library(&self, books: &[Audiobook]) {
        let Some(loaded) = self.loaded_book_id().await else {
            return;
        };

        if let Some(book) = books.iter().find(|b| b.id == loaded) {
            self.update_current_track_artwork(book).await;
        }
    }
}
