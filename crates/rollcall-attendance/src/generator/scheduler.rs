//! Per-session token rotation.
//!
//! Each running session owns two background tasks:
//!
//! - the rotation task, which generates a token immediately and then once per
//!   rotation interval (or on demand via [`RotationScheduler::refresh`])
//! - the countdown task, which ticks the cosmetic seconds-remaining counter
//!   and resets it whenever a new token is published
//!
//! Both publish through watch channels that back [`DisplayFeed`]. A rotation
//! ends on `stop`, or by itself once the store refuses its token because the
//! session was closed. The
//! scheduler is keyed by session id and is independent of any display, so
//! there is exactly one authoritative generator per session no matter how
//! many screens are watching.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{Notify, watch};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use rollcall_core::config::AttendanceConfig;
use rollcall_core::error::AppError;

use super::display::DisplayFeed;
use super::token_generator::{GeneratedToken, TokenGenerator};
use crate::store::AttendanceStore;

#[derive(Debug)]
struct RotationHandle {
    cancel: watch::Sender<bool>,
    refresh: Arc<Notify>,
    feed: DisplayFeed,
}

impl RotationHandle {
    /// False once both tasks have exited on their own.
    fn is_live(&self) -> bool {
        !self.cancel.is_closed()
    }
}

/// Starts, refreshes, and stops token rotation per session.
#[derive(Debug)]
pub struct RotationScheduler {
    generator: TokenGenerator,
    store: Arc<dyn AttendanceStore>,
    rotation_interval: Duration,
    countdown_tick: Duration,
    running: DashMap<Uuid, RotationHandle>,
}

impl RotationScheduler {
    /// Creates a scheduler with the configured rotation timings.
    pub fn new(store: Arc<dyn AttendanceStore>, config: &AttendanceConfig) -> Self {
        Self {
            generator: TokenGenerator::new(Arc::clone(&store), config.token_lifetime_ms()),
            store,
            rotation_interval: config.rotation_interval(),
            countdown_tick: config.countdown_tick(),
            running: DashMap::new(),
        }
    }

    /// Start rotating tokens for an open session.
    ///
    /// If the session is already rotating, the existing feed is returned and
    /// no second generator is started.
    pub async fn start(&self, session_id: Uuid) -> Result<DisplayFeed, AppError> {
        if let Some(handle) = self.running.get(&session_id) {
            if handle.is_live() {
                return Ok(handle.feed.clone());
            }
        }

        let session = self.store.read_session(session_id).await?.ok_or_else(|| {
            AppError::not_found(format!("Attendance session {} not found", session_id))
        })?;
        if !session.is_open {
            return Err(AppError::conflict(format!(
                "Attendance session {} is closed",
                session_id
            )));
        }

        let feed = match self.running.entry(session_id) {
            Entry::Occupied(existing) if existing.get().is_live() => existing.get().feed.clone(),
            entry => {
                let handle = self.spawn(session_id);
                let feed = handle.feed.clone();
                entry.insert(handle);
                info!(
                    session_id = %session_id,
                    interval_secs = self.rotation_interval.as_secs(),
                    "Token rotation started"
                );
                feed
            }
        };
        Ok(feed)
    }

    /// Force an immediate rotation and restart the interval.
    ///
    /// Returns `false` if the session is not rotating.
    pub fn refresh(&self, session_id: Uuid) -> bool {
        match self.running.get(&session_id) {
            Some(handle) if handle.is_live() => {
                handle.refresh.notify_one();
                debug!(session_id = %session_id, "Token refresh requested");
                true
            }
            _ => false,
        }
    }

    /// Stop rotation for a session. The session's active token is left as is.
    ///
    /// Returns `false` if the session was not rotating.
    pub fn stop(&self, session_id: Uuid) -> bool {
        match self.running.remove(&session_id) {
            Some((_, handle)) if handle.is_live() => {
                let _ = handle.cancel.send(true);
                info!(session_id = %session_id, "Token rotation stopped");
                true
            }
            _ => false,
        }
    }

    /// Stop every running rotation.
    pub fn shutdown(&self) {
        let session_ids: Vec<Uuid> = self.running.iter().map(|entry| *entry.key()).collect();
        for session_id in &session_ids {
            self.stop(*session_id);
        }
        if !session_ids.is_empty() {
            info!(count = session_ids.len(), "All token rotations stopped");
        }
    }

    /// Whether a session is currently rotating.
    pub fn is_running(&self, session_id: Uuid) -> bool {
        self.running
            .get(&session_id)
            .is_some_and(|handle| handle.is_live())
    }

    /// Feed of a running session.
    pub fn feed(&self, session_id: Uuid) -> Option<DisplayFeed> {
        self.running
            .get(&session_id)
            .filter(|handle| handle.is_live())
            .map(|handle| handle.feed.clone())
    }

    fn spawn(&self, session_id: Uuid) -> RotationHandle {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (token_tx, token_rx) = watch::channel(None);
        let full_countdown = self.rotation_interval.as_secs();
        let (countdown_tx, countdown_rx) = watch::channel(full_countdown);
        let refresh = Arc::new(Notify::new());

        tokio::spawn(run_rotation(
            self.generator.clone(),
            session_id,
            self.rotation_interval,
            token_tx,
            cancel_rx.clone(),
            Arc::clone(&refresh),
        ));
        tokio::spawn(run_countdown(
            self.countdown_tick,
            full_countdown,
            countdown_tx,
            token_rx.clone(),
            cancel_rx,
        ));

        RotationHandle {
            cancel: cancel_tx,
            refresh,
            feed: DisplayFeed::new(session_id, token_rx, countdown_rx),
        }
    }
}

/// Generates immediately, then on every tick or refresh until cancelled.
///
/// The store write is awaited outside the `select!`, so cancellation never
/// interrupts a write in progress; it only prevents the next one. A write
/// racing a close is refused by the store, which also ends the task.
async fn run_rotation(
    generator: TokenGenerator,
    session_id: Uuid,
    interval: Duration,
    token_tx: watch::Sender<Option<GeneratedToken>>,
    mut cancel: watch::Receiver<bool>,
    refresh: Arc<Notify>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.changed() => break,
            _ = ticker.tick() => {}
            _ = refresh.notified() => {
                ticker.reset();
            }
        }

        let generated = match generator.generate(session_id).await {
            Ok(generated) => generated,
            Err(e) => {
                info!(session_id = %session_id, reason = %e, "Token rotation ended");
                break;
            }
        };

        if *cancel.borrow() {
            break;
        }
        token_tx.send_replace(Some(generated));
    }

    debug!(session_id = %session_id, "Rotation task exited");
}

/// Ticks the seconds-remaining counter and resets it on every new token.
async fn run_countdown(
    tick: Duration,
    full: u64,
    countdown_tx: watch::Sender<u64>,
    mut token_rx: watch::Receiver<Option<GeneratedToken>>,
    mut cancel: watch::Receiver<bool>,
) {
    let step = tick.as_secs().max(1);
    let mut ticker = time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.changed() => break,
            changed = token_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                countdown_tx.send_replace(full);
                ticker.reset();
            }
            _ = ticker.tick() => {
                countdown_tx.send_if_modified(|remaining| {
                    if *remaining == 0 {
                        return false;
                    }
                    *remaining = remaining.saturating_sub(step);
                    true
                });
            }
        }
    }
}
