//! Shared fixtures: a scripted media device and instrumented stores
#![allow(dead_code)]

use async_trait::async_trait;
use earmark_core::{AppError, Audiobook, AudiobookPart};
use earmark_database::{KeyValueStore, LibraryStore, MemoryKvStore, AUDIOBOOKS_KEY};
use earmark_session::{
    DeviceError, DeviceResult, DeviceState, MediaDevice, NowPlaying, PlaybackController,
    QueueTrack,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Every call the device received, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Initialize,
    Reset,
    SetQueue(Vec<String>),
    SkipTo(usize, f64),
    Play,
    Pause,
    SeekTo(f64),
    SeekBy(f64),
    SetRate(f32),
    UpdateMetadata(usize, String),
}

#[derive(Debug)]
struct DeviceInner {
    initialized: bool,
    queue: Vec<QueueTrack>,
    active: Option<usize>,
    position: f64,
    rate: f32,
    state: DeviceState,
    ops: Vec<Op>,
    queue_failures: usize,
    fail_state_queries: bool,
    fail_metadata: bool,
}

/// In-process stand-in for the platform media session
#[derive(Debug)]
pub struct MockDevice {
    inner: Mutex<DeviceInner>,
}

impl MockDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(DeviceInner {
                initialized: false,
                queue: Vec::new(),
                active: None,
                position: 0.0,
                rate: 1.0,
                state: DeviceState::None,
                ops: Vec::new(),
                queue_failures: 0,
                fail_state_queries: false,
                fail_metadata: false,
            }),
        })
    }

    fn with<R>(&self, f: impl FnOnce(&mut DeviceInner) -> R) -> R {
        f(&mut self.inner.lock().unwrap())
    }

    pub fn ops(&self) -> Vec<Op> {
        self.with(|d| d.ops.clone())
    }

    pub fn clear_ops(&self) {
        self.with(|d| d.ops.clear());
    }

    /// The next `count` queue loads fail and tear the session down
    pub fn fail_next_loads(&self, count: usize) {
        self.with(|d| d.queue_failures = count);
    }

    /// Simulates the OS destroying the session
    pub fn tear_down(&self) {
        self.with(|d| d.initialized = false);
    }

    pub fn fail_state_queries(&self, fail: bool) {
        self.with(|d| d.fail_state_queries = fail);
    }

    pub fn fail_metadata(&self, fail: bool) {
        self.with(|d| d.fail_metadata = fail);
    }

    pub fn set_position(&self, seconds: f64) {
        self.with(|d| d.position = seconds);
    }

    pub fn set_state(&self, state: DeviceState) {
        self.with(|d| d.state = state);
    }

    /// Simulates the device advancing to another queue entry on its own
    pub fn advance_to(&self, index: usize, position: f64) {
        self.with(|d| {
            d.active = Some(index);
            d.position = position;
        });
    }

    pub fn active_index(&self) -> Option<usize> {
        self.with(|d| d.active)
    }

    pub fn position_now(&self) -> f64 {
        self.with(|d| d.position)
    }

    pub fn state_now(&self) -> DeviceState {
        self.with(|d| d.state)
    }

    pub fn queue_ids(&self) -> Vec<String> {
        self.with(|d| d.queue.iter().map(|t| t.id.clone()).collect())
    }

    pub fn rate_now(&self) -> f32 {
        self.with(|d| d.rate)
    }
}

fn require_session(d: &DeviceInner) -> DeviceResult<()> {
    if d.initialized {
        Ok(())
    } else {
        Err(DeviceError::NotInitialized)
    }
}

#[async_trait]
impl MediaDevice for MockDevice {
    async fn initialize(&self) -> DeviceResult<()> {
        self.with(|d| {
            d.ops.push(Op::Initialize);
            d.initialized = true;
            Ok(())
        })
    }

    async fn reset(&self) -> DeviceResult<()> {
        self.with(|d| {
            d.ops.push(Op::Reset);
            require_session(d)?;
            d.queue.clear();
            d.active = None;
            d.position = 0.0;
            d.state = DeviceState::None;
            Ok(())
        })
    }

    async fn set_queue(&self, tracks: Vec<QueueTrack>) -> DeviceResult<()> {
        self.with(|d| {
            d.ops
                .push(Op::SetQueue(tracks.iter().map(|t| t.id.clone()).collect()));
            if d.queue_failures > 0 {
                d.queue_failures -= 1;
                d.initialized = false;
                return Err(DeviceError::call_failed("set_queue", "session destroyed"));
            }
            require_session(d)?;
            d.active = if tracks.is_empty() { None } else { Some(0) };
            d.queue = tracks;
            d.position = 0.0;
            d.state = DeviceState::Ready;
            Ok(())
        })
    }

    async fn skip_to(&self, index: usize, position: f64) -> DeviceResult<()> {
        self.with(|d| {
            d.ops.push(Op::SkipTo(index, position));
            require_session(d)?;
            if index >= d.queue.len() {
                return Err(DeviceError::IndexOutOfRange {
                    index,
                    len: d.queue.len(),
                });
            }
            d.active = Some(index);
            d.position = position;
            Ok(())
        })
    }

    async fn play(&self) -> DeviceResult<()> {
        self.with(|d| {
            d.ops.push(Op::Play);
            require_session(d)?;
            if d.active.is_none() {
                return Err(DeviceError::call_failed("play", "empty queue"));
            }
            d.state = DeviceState::Playing;
            Ok(())
        })
    }

    async fn pause(&self) -> DeviceResult<()> {
        self.with(|d| {
            d.ops.push(Op::Pause);
            require_session(d)?;
            d.state = DeviceState::Paused;
            Ok(())
        })
    }

    async fn seek_to(&self, position: f64) -> DeviceResult<()> {
        self.with(|d| {
            d.ops.push(Op::SeekTo(position));
            require_session(d)?;
            d.position = position;
            Ok(())
        })
    }

    async fn seek_by(&self, offset: f64) -> DeviceResult<()> {
        self.with(|d| {
            d.ops.push(Op::SeekBy(offset));
            require_session(d)?;
            d.position = (d.position + offset).max(0.0);
            Ok(())
        })
    }

    async fn set_rate(&self, rate: f32) -> DeviceResult<()> {
        self.with(|d| {
            d.ops.push(Op::SetRate(rate));
            require_session(d)?;
            d.rate = rate;
            Ok(())
        })
    }

    async fn rate(&self) -> DeviceResult<f32> {
        self.with(|d| {
            require_session(d)?;
            Ok(d.rate)
        })
    }

    async fn position(&self) -> DeviceResult<f64> {
        self.with(|d| {
            require_session(d)?;
            if d.fail_state_queries {
                return Err(DeviceError::call_failed("position", "unavailable"));
            }
            Ok(d.position)
        })
    }

    async fn duration(&self) -> DeviceResult<f64> {
        self.with(|d| {
            require_session(d)?;
            Ok(d
                .active
                .and_then(|i| d.queue.get(i))
                .and_then(|t| t.metadata.duration)
                .unwrap_or(0.0))
        })
    }

    async fn state(&self) -> DeviceResult<DeviceState> {
        self.with(|d| {
            require_session(d)?;
            if d.fail_state_queries {
                return Err(DeviceError::call_failed("state", "unavailable"));
            }
            Ok(d.state)
        })
    }

    async fn active_track_id(&self) -> DeviceResult<Option<String>> {
        self.with(|d| {
            require_session(d)?;
            Ok(d.active.and_then(|i| d.queue.get(i)).map(|t| t.id.clone()))
        })
    }

    async fn update_metadata(&self, index: usize, metadata: NowPlaying) -> DeviceResult<()> {
        self.with(|d| {
            d.ops.push(Op::UpdateMetadata(index, metadata.title.clone()));
            if d.fail_metadata {
                return Err(DeviceError::call_failed("update_metadata", "rejected"));
            }
            require_session(d)?;
            if let Some(track) = d.queue.get_mut(index) {
                track.metadata = metadata;
            }
            Ok(())
        })
    }
}

/// Memory store that counts writes
#[derive(Debug, Default)]
pub struct CountingKvStore {
    inner: MemoryKvStore,
    writes: AtomicUsize,
}

impl CountingKvStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for CountingKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key).await
    }
}

/// Memory store that can hold back a listing read until released
///
/// Once armed, the first write of the listing closes the gate and the next
/// read of it parks.
#[derive(Debug, Default)]
pub struct GatedKvStore {
    inner: MemoryKvStore,
    armed: AtomicBool,
    closed: AtomicBool,
    parked: Notify,
    released: Notify,
}

impl GatedKvStore {
    pub fn hold_listing_read_after_next_write(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub async fn wait_until_parked(&self) {
        self.parked.notified().await;
    }

    pub fn release(&self) {
        self.released.notify_one();
    }
}

#[async_trait]
impl KeyValueStore for GatedKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        if key == AUDIOBOOKS_KEY && self.closed.swap(false, Ordering::SeqCst) {
            self.parked.notify_one();
            self.released.notified().await;
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.inner.set(key, value).await?;
        if key == AUDIOBOOKS_KEY && self.armed.swap(false, Ordering::SeqCst) {
            self.closed.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.inner.remove(key).await
    }
}

pub fn three_part_book() -> Audiobook {
    let parts = (1..=3)
        .map(|n| {
            AudiobookPart::new(format!("file:///saga/{:02}.mp3", n), format!("{:02}.mp3", n))
                .with_part_number(n)
                .with_duration(600.0)
        })
        .collect();
    let mut book = Audiobook::from_parts("Saga", parts).unwrap();
    book.author = Some("A. Writer".to_string());
    book
}

pub fn single_file_book(title: &str) -> Audiobook {
    let mut book = Audiobook::new(title, format!("file:///books/{}.m4b", title));
    book.total_duration_seconds = Some(3600.0);
    book
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub async fn initialized_controller() -> (Arc<MockDevice>, Arc<PlaybackController>) {
    init_logging();
    let device = MockDevice::new();
    let controller = Arc::new(PlaybackController::new(device.clone()));
    controller.initialize().await.unwrap();
    device.clear_ops();
    (device, controller)
}

pub fn counting_store() -> (Arc<CountingKvStore>, Arc<LibraryStore>) {
    let kv = Arc::new(CountingKvStore::default());
    let store = Arc::new(LibraryStore::new(kv.clone()));
    (kv, store)
}
