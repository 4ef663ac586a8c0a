// FILE: crates/session/src/sleep_timer.rs

//! Sleep timer
//!
//! Holds an absolute wall-clock deadline rather than a countdown, so time
//! spent suspended still counts. A background tick recomputes what is left
//! and fires the bound action once when the deadline passes.

use crate::clock::Clock;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// What happens when the timer runs out
#[async_trait]
pub trait TimerAction: Send + Sync {
    async fn on_elapsed(&self);
}

pub struct SleepTimer {
    clock: Arc<dyn Clock>,
    action: Arc<dyn TimerAction>,
    deadline: Mutex<Option<i64>>,
    remaining: watch::Sender<Option<i64>>,
}

impl SleepTimer {
    pub fn new(clock: Arc<dyn Clock>, action: Arc<dyn TimerAction>) -> Self {
        let (remaining, _) = watch::channel(None);
        Self {
            clock,
            action,
            deadline: Mutex::new(None),
            remaining,
        }
    }

    /// Arms the timer for `minutes`, replacing any previous deadline
    ///
    /// `None`, zero, negative or non-finite durations cancel the timer
    /// without firing.
    pub async fn set_timer(&self, minutes: Option<f64>) {
        let mut deadline = self.deadline.lock().await;

        match minutes.filter(|m| m.is_finite() && *m > 0.0) {
            Some(minutes) => {
                // `as` saturates, so absurd durations pin to the far future
                let duration_ms = (minutes * 60_000.0).round() as i64;
                let at = self.clock.now_millis().saturating_add(duration_ms);
                *deadline = Some(at);
                self.remaining.send_replace(Some(duration_ms));
                log::info!("Sleep timer set for {} min", minutes);
            }
            None => {
                if deadline.take().is_some() {
                    log::info!("Sleep timer cancelled");
                }
                self.remaining.send_replace(None);
            }
        }
    }

    /// Recomputes the remaining time and fires once the deadline has passed
    pub async fn tick(&self) {
        let elapsed = {
            let mut deadline = self.deadline.lock().await;
            let Some(at) = *deadline else {
                return;
            };

            let remaining = at.saturating_sub(self.clock.now_millis());
            if remaining <= 0 {
                *deadline = None;
                self.remaining.send_replace(None);
                true
            } else {
                self.remaining.send_replace(Some(remaining));
                false
            }
        };

        if elapsed {
            log::info!("Sleep timer elapsed");
            self.action.on_elapsed().await;
        }
    }

    /// Milliseconds left as of the last tick, `None` when disarmed
    pub fn remaining_ms(&self) -> Option<i64> {
        *self.remaining.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<i64>> {
        self.remaining.subscribe()
    }

    pub async fn is_active(&self) -> bool {
        self.deadline.lock().await.is_some()
    }

    /// Drives [`Self::tick`] every `interval` until the handle is aborted
    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.tick().await;
            }
        })
    }
}
