// FILE: crates/session/src/aggregator.rs

//! Session state aggregator
//!
//! Combines live device state, the current book and the library listing into
//! one [`PlaybackSnapshot`], published over a `watch` channel. It is the only
//! writer of position and part progress into the library store, and the only
//! place that decides when to flush it.
//!
//! All session operations serialize on one async mutex, so the poll loop,
//! the auto-save loop, the sleep timer and UI calls never interleave halfway.

use crate::clock::Clock;
use crate::controller::PlaybackController;
use crate::error::SessionResult;
use crate::sleep_timer::{SleepTimer, TimerAction};
use async_trait::async_trait;
use earmark_config::SessionConfig;
use earmark_core::{
    Audiobook, AudiobookPatch, BookId, PlaybackRate, PlaybackSnapshot, Settings, SettingsPatch,
};
use earmark_database::LibraryStore;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Default)]
struct SessionInner {
    current_book: Option<Audiobook>,
    settings: Settings,
}

/// Owns the current book and publishes session state
///
/// Call [`SessionAggregator::shutdown`] before letting go of the last handle.
/// It waits for the final progress write. Dropping the last `Arc` instead only
/// spawns that write on the current runtime, which may exit before it runs.
pub struct SessionAggregator {
    controller: Arc<PlaybackController>,
    store: Arc<LibraryStore>,
    config: SessionConfig,
    inner: Mutex<SessionInner>,
    snapshot_tx: watch::Sender<PlaybackSnapshot>,
    library_tx: watch::Sender<Vec<Audiobook>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionAggregator {
    pub fn new(
        controller: Arc<PlaybackController>,
        store: Arc<LibraryStore>,
        config: SessionConfig,
    ) -> Arc<Self> {
        let (snapshot_tx, _) = watch::channel(PlaybackSnapshot {
            rate: 1.0,
            ..Default::default()
        });
        let (library_tx, _) = watch::channel(Vec::new());

        Arc::new(Self {
            controller,
            store,
            config,
            inner: Mutex::new(SessionInner::default()),
            snapshot_tx,
            library_tx,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Initializes the device, loads settings and the library, and starts
    /// the poll and auto-save loops
    pub async fn start(self: &Arc<Self>) -> SessionResult<()> {
        self.controller.initialize().await?;

        let settings = self.store.get_settings().await;
        self.inner.lock().await.settings = settings;
        self.refresh_library().await;

        let poll = spawn_loop(
            Arc::downgrade(self),
            self.config.poll_interval(),
            |session| async move { session.poll_once().await },
        );
        let autosave = spawn_loop(
            Arc::downgrade(self),
            self.config.autosave_interval(),
            |session| async move { session.save_current_progress().await },
        );

        let mut tasks = self.tasks.lock().await;
        tasks.push(poll);
        tasks.push(autosave);

        log::info!(
            "Session started (poll every {:?}, auto-save every {:?})",
            self.config.poll_interval(),
            self.config.autosave_interval()
        );
        Ok(())
    }

    /// Stops the background loops and flushes progress one last time
    pub async fn shutdown(&self) {
        for task in self.tasks.lock().await.drain(..) {
            task.abort();
        }

        let mut inner = self.inner.lock().await;
        self.flush_locked(&mut inner).await;
        log::info!("Session shut down");
    }

    /// Creates a sleep timer that pauses this session and starts its tick loop
    ///
    /// The loop is stopped by [`Self::shutdown`] along with the others.
    pub async fn start_sleep_timer(self: &Arc<Self>, clock: Arc<dyn Clock>) -> Arc<SleepTimer> {
        let action = Arc::new(PauseSession(Arc::downgrade(self)));
        let timer = Arc::new(SleepTimer::new(clock, action));
        let handle = timer.clone().spawn(self.config.sleep_timer_tick());
        self.tasks.lock().await.push(handle);
        timer
    }

    /// One poll cycle: mirror live progress into the current book and publish
    pub async fn poll_once(&self) {
        let mut inner = self.inner.lock().await;
        self.mirror_live_progress(&mut inner).await;
        self.publish_locked(&inner).await;
    }

    /// Loads `book`, starts playing it and makes it the current book
    ///
    /// The previous book's progress is flushed first when switching. On
    /// failure the error is logged and returned and the last published
    /// snapshot stays as it was.
    pub async fn play_audiobook(&self, book: Audiobook) -> SessionResult<()> {
        let mut inner = self.inner.lock().await;

        let switching = inner
            .current_book
            .as_ref()
            .map_or(false, |current| current.id != book.id);
        if switching {
            self.flush_locked(&mut inner).await;
        }

        self.start_locked(&mut inner, book).await?;
        drop(inner);

        self.refresh_library().await;
        Ok(())
    }

    async fn start_locked(&self, inner: &mut SessionInner, mut book: Audiobook) -> SessionResult<()> {
        let index = book.resolved_part_index();
        book.select_part(index);

        if let Err(e) = self.controller.load_audiobook(&book).await {
            log::error!("Could not load \"{}\": {}", book.title, e);
            return Err(e);
        }

        self.controller.set_rate(inner.settings.playback_rate).await;
        self.controller.play().await;

        book.mark_played();
        let mut patch = AudiobookPatch::new();
        if let Some(at) = book.last_played_at {
            patch = patch.last_played_at(at);
        }
        if book.is_multi_part() {
            patch = patch.part_index(index);
        }
        self.store.update_audiobook(book.id, &patch).await;

        inner.current_book = Some(book);
        self.publish_locked(inner).await;
        Ok(())
    }

    /// Pauses if playing, otherwise resumes (reloading the book if needed)
    pub async fn toggle_play_pause(&self) {
        let mut inner = self.inner.lock().await;
        let Some(current) = inner.current_book.clone() else {
            log::debug!("Nothing to toggle, no current book");
            return;
        };

        if self.controller.get_state().await.is_playing() {
            self.controller.pause().await;
            self.flush_locked(&mut inner).await;
        } else if self.controller.loaded_book_id().await != Some(current.id) {
            if let Err(e) = self.start_locked(&mut inner, current).await {
                log::warn!("Resume failed: {}", e);
            }
        } else {
            let rewind = inner.settings.auto_rewind_seconds;
            if rewind > 0 {
                self.controller.skip_backward(f64::from(rewind)).await;
            }
            self.controller.play().await;
        }

        self.publish_locked(&inner).await;
    }

    pub async fn play(&self) {
        let mut inner = self.inner.lock().await;
        let Some(current) = inner.current_book.clone() else {
            return;
        };

        if self.controller.loaded_book_id().await == Some(current.id) {
            self.controller.play().await;
        } else if let Err(e) = self.start_locked(&mut inner, current).await {
            log::warn!("Resume failed: {}", e);
        }
        self.publish_locked(&inner).await;
    }

    /// Pauses and flushes progress immediately
    pub async fn pause(&self) {
        let mut inner = self.inner.lock().await;
        self.controller.pause().await;
        self.flush_locked(&mut inner).await;
        self.publish_locked(&inner).await;
    }

    pub async fn seek_to(&self, seconds: f64) {
        self.controller.seek_to(seconds).await;
        self.poll_once().await;
    }

    /// Jumps forward by `seconds`, or by the configured amount
    pub async fn skip_forward(&self, seconds: Option<f64>) {
        let amount = match seconds {
            Some(s) => s,
            None => f64::from(self.inner.lock().await.settings.skip_forward_seconds),
        };
        self.controller.skip_forward(amount).await;
        self.poll_once().await;
    }

    /// Jumps backward by `seconds`, or by the configured amount
    pub async fn skip_backward(&self, seconds: Option<f64>) {
        let amount = match seconds {
            Some(s) => s,
            None => f64::from(self.inner.lock().await.settings.skip_backward_seconds),
        };
        self.controller.skip_backward(amount).await;
        self.poll_once().await;
    }

    /// Changes the rate and remembers it as the preferred rate
    pub async fn set_rate(&self, rate: f32) {
        let rate = PlaybackRate::clamped(rate).value();
        self.controller.set_rate(rate).await;

        let patch = SettingsPatch {
            playback_rate: Some(rate),
            ..Default::default()
        };
        let settings = self.store.save_settings(&patch).await;
        self.inner.lock().await.settings = settings;
        self.poll_once().await;
    }

    /// Stops playback, keeping the book current and its position saved
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        let loaded = self.controller.loaded_book_id().await;

        if let Some(position) = self.controller.stop().await {
            if let Some(book) = inner.current_book.as_mut() {
                if loaded == Some(book.id) {
                    book.current_position_seconds = position;
                }
            }
        }

        self.flush_locked(&mut inner).await;
        self.publish_locked(&inner).await;
    }

    /// Writes the current book's progress to the store
    ///
    /// A no-op without a current book or while the position is not positive.
    pub async fn save_current_progress(&self) {
        let mut inner = self.inner.lock().await;
        self.flush_locked(&mut inner).await;
    }

    async fn mirror_live_progress(&self, inner: &mut SessionInner) {
        if let Some(book) = inner.current_book.as_mut() {
            mirror_progress(&self.controller, book).await;
        }
    }

    async fn flush_locked(&self, inner: &mut SessionInner) {
        if let Some(book) = inner.current_book.as_mut() {
            mirror_progress(&self.controller, book).await;
            persist_progress(&self.store, book).await;
        }
    }

    async fn publish_locked(&self, inner: &SessionInner) {
        let state = self.controller.get_state().await;
        let snapshot = PlaybackSnapshot {
            is_playing: state.is_playing(),
            position: self.controller.get_position().await,
            duration: self.controller.get_duration().await,
            rate: self.controller.get_rate().await,
            current_book: inner.current_book.clone(),
        };
        self.snapshot_tx.send_replace(snapshot);
    }

    /// Deletes a book; if it is the current one, playback stops and the
    /// session is cleared before the listing is refreshed
    pub async fn remove_audiobook(&self, id: BookId) {
        self.store.delete_audiobook(id).await;

        {
            let mut inner = self.inner.lock().await;
            if inner.current_book.as_ref().map(|b| b.id) == Some(id) {
                self.controller.stop().await;
                inner.current_book = None;
                self.publish_locked(&inner).await;
            }
        }

        self.refresh_library().await;
    }

    /// Reloads the listing, re-syncs now-playing metadata and picks up
    /// edited details of the current book
    pub async fn refresh_library(&self) {
        let books = self.store.get_audiobooks().await;
        self.controller.sync_artwork_from_library(&books).await;

        {
            let mut inner = self.inner.lock().await;
            let mut changed = false;
            if let Some(current) = inner.current_book.as_mut() {
                if let Some(stored) = books.iter().find(|b| b.id == current.id) {
                    changed = current.title != stored.title
                        || current.author != stored.author
                        || current.artwork_uri != stored.artwork_uri
                        || current.is_finished != stored.is_finished;
                    current.title = stored.title.clone();
                    current.author = stored.author.clone();
                    current.artwork_uri = stored.artwork_uri.clone();
                    current.is_finished = stored.is_finished;
                }
            }
            if changed {
                self.publish_locked(&inner).await;
            }
        }

        log::debug!("Library refreshed ({} audiobooks)", books.len());
        self.library_tx.send_replace(books);
    }

    /// Applies a title, author or artwork edit; other patch fields are ignored
    pub async fn update_audiobook_details(&self, id: BookId, patch: &AudiobookPatch) {
        let details = AudiobookPatch {
            title: patch.title.clone(),
            author: patch.author.clone(),
            artwork_uri: patch.artwork_uri.clone(),
            ..Default::default()
        };
        if details.is_empty() {
            return;
        }

        self.store.update_audiobook(id, &details).await;
        self.refresh_library().await;
    }

    pub async fn mark_finished(&self, id: BookId, finished: bool) {
        let patch = AudiobookPatch::new().finished(finished);
        self.store.update_audiobook(id, &patch).await;
        self.refresh_library().await;
    }

    pub async fn settings(&self) -> Settings {
        self.inner.lock().await.settings.clone()
    }

    pub async fn update_settings(&self, patch: &SettingsPatch) -> Settings {
        let settings = self.store.save_settings(patch).await;
        self.inner.lock().await.settings = settings.clone();

        if patch.playback_rate.is_some() && self.controller.loaded_book_id().await.is_some() {
            self.controller.set_rate(settings.playback_rate).await;
        }
        settings
    }

    pub async fn current_book(&self) -> Option<Audiobook> {
        self.inner.lock().await.current_book.clone()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn audiobooks(&self) -> Vec<Audiobook> {
        self.library_tx.borrow().clone()
    }

    pub fn subscribe_library(&self) -> watch::Receiver<Vec<Audiobook>> {
        self.library_tx.subscribe()
    }
}

#[async_trait]
impl TimerAction for SessionAggregator {
    async fn on_elapsed(&self) {
        log::info!("Sleep timer pausing playback");
        self.pause().await;
    }
}

impl Drop for SessionAggregator {
    /// Stops the loops and hands a last flush to the runtime, so progress
    /// survives a session dropped without [`SessionAggregator::shutdown`]
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }

        let Some(mut book) = self.inner.get_mut().current_book.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::warn!("Session dropped outside the runtime; \"{}\" not saved", book.title);
            return;
        };

        let controller = self.controller.clone();
        let store = self.store.clone();
        runtime.spawn(async move {
            mirror_progress(&controller, &mut book).await;
            persist_progress(&store, &book).await;
        });
    }
}

async fn mirror_progress(controller: &PlaybackController, book: &mut Audiobook) {
    if controller.loaded_book_id().await != Some(book.id) {
        return;
    }

    let position = controller.get_position().await;

    let moved = match controller.current_part_index().await {
        Some(index) if book.is_multi_part() && index != book.resolved_part_index() => {
            log::debug!("\"{}\" moved to part {}", book.title, index);
            book.select_part(index)
        }
        _ => false,
    };

    // A position only has meaning relative to its part, so a part change
    // takes the new offset even when it is still zero
    if moved || position > 0.0 {
        book.current_position_seconds = position;
    }
}

async fn persist_progress(store: &LibraryStore, book: &Audiobook) {
    let position = book.current_position_seconds;
    if position <= 0.0 {
        return;
    }

    let mut patch = AudiobookPatch::new().position(position);
    if book.is_multi_part() {
        patch = patch.part_index(book.resolved_part_index());
    }
    store.update_audiobook(book.id, &patch).await;
    log::debug!("Saved \"{}\" at {:.1}s", book.title, position);
}

struct PauseSession(Weak<SessionAggregator>);

#[async_trait]
impl TimerAction for PauseSession {
    async fn on_elapsed(&self) {
        if let Some(session) = self.0.upgrade() {
            session.on_elapsed().await;
        }
    }
}

fn spawn_loop<F, Fut>(session: Weak<SessionAggregator>, period: Duration, mut step: F) -> JoinHandle<()>
where
    F: FnMut(Arc<SessionAggregator>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(session) = session.upgrade() else {
                break;
            };
            step(session).await;
        }
    })
}
