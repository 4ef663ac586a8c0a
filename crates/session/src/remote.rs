// FILE: crates/session/src/remote.rs

//! Background remote-control entry point
//!
//! Lock-screen, headset and car controls can arrive while no UI exists, so
//! this handler works from the controller and the library store alone.

use crate::controller::PlaybackController;
use earmark_core::AudiobookPatch;
use earmark_database::LibraryStore;
use std::sync::Arc;

/// A transport command issued by the OS
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoteCommand {
    Play,
    Pause,
    Stop,
    SeekTo(f64),
    SeekBy(f64),
    /// Jump forward by the given seconds, or the configured skip amount
    JumpForward(Option<f64>),
    /// Jump backward by the given seconds, or the configured skip amount
    JumpBackward(Option<f64>),
}

pub struct RemoteControlHandler {
    controller: Arc<PlaybackController>,
    store: Arc<LibraryStore>,
}

impl RemoteControlHandler {
    pub fn new(controller: Arc<PlaybackController>, store: Arc<LibraryStore>) -> Self {
        Self { controller, store }
    }

    pub async fn handle(&self, command: RemoteCommand) {
        log::debug!("Remote command: {:?}", command);

        match command {
            RemoteCommand::Play => self.controller.play().await,
            RemoteCommand::Pause => {
                self.controller.pause().await;
                let position = self.controller.get_position().await;
                self.persist(position).await;
            }
            RemoteCommand::Stop => self.stop().await,
            RemoteCommand::SeekTo(seconds) => self.controller.seek_to(seconds).await,
            RemoteCommand::SeekBy(offset) => self.controller.seek_by(offset).await,
            RemoteCommand::JumpForward(seconds) => {
                let amount = match seconds {
                    Some(s) => s,
                    None => f64::from(self.store.get_settings().await.skip_forward_seconds),
                };
                self.controller.skip_forward(amount).await;
            }
            RemoteCommand::JumpBackward(seconds) => {
                let amount = match seconds {
                    Some(s) => s,
                    None => f64::from(self.store.get_settings().await.skip_backward_seconds),
                };
                self.controller.skip_backward(amount).await;
            }
        }
    }

    async fn stop(&self) {
        // Resolve the part before stopping: the device forgets it on reset.
        let loaded = self.controller.loaded_book_id().await;
        let part = self.controller.current_part_index().await;

        let Some(position) = self.controller.stop().await else {
            return;
        };
        let Some(id) = loaded else {
            return;
        };

        let mut patch = AudiobookPatch::new().position(position);
        if let Some(index) = part {
            patch = patch.part_index(index);
        }
        self.store.update_audiobook(id, &patch).await;
        log::info!("Saved {} at {:.1}s before stopping", id, position);
    }

    async fn persist(&self, position: f64) {
        if position <= 0.0 {
            return;
        }
        let Some(id) = self.controller.loaded_book_id().await else {
            return;
        };

        let mut patch = AudiobookPatch::new().position(position);
        if let Some(index) = self.controller.current_part_index().await {
            patch = patch.part_index(index);
        }
        self.store.update_audiobook(id, &patch).await;
    }
}
