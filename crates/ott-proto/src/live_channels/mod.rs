//! Live channel tracker.
//!
//! Keeps the schedule of every live channel, derives the active channel and
//! the program on air, and refetches schedules when that program ends.
//!
//! # Ownership
//! A single tokio task owns the cache, the selection and the timer.
//! Consumers hold a [`LiveChannelsHandle`]: they read [`LiveSnapshot`]s from
//! a `watch` channel and send commands over `mpsc`. Dropping the last handle
//! closes the command channel, which ends the task and cancels the timer.
//!
//! # Refresh cycle
//! ```text
//!  start ──► fetch ──► apply (stale results dropped) ──► derive selection
//!              ▲                                               │
//!              └──── timer fires (program end | fallback) ◄── arm
//! ```

mod cache;
mod selection;
mod timer;


use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

pub use cache::ScheduleCache;
pub use selection::Selection;
pub use timer::RefreshTimer;

use crate::clock::Clock;
use crate::error::ScheduleError;
use crate::models::{Channel, PlaylistItem, Program};
use crate::schedule::ScheduleService;

/// Startup options for the tracker.
#[derive(Debug, Clone)]
pub struct LiveOptions {
    pub initial_channel_id: Option<String>,
    pub auto_update: bool,
    pub fallback_interval: Duration,
}

impl Default for LiveOptions {
    fn default() -> Self {
        Self {
            initial_channel_id: None,
            auto_update: true,
            fallback_interval: Duration::from_secs(300),
        }
    }
}

/// What consumers see: the schedule and the active selection.
#[derive(Debug, Clone, Default)]
pub struct LiveSnapshot {
    pub channels: Arc<Vec<Channel>>,
    /// Index into `channels` of the active channel.
    pub channel_index: Option<usize>,
    pub program: Option<Program>,
    /// The program is derived from the clock rather than pinned.
    pub follow_live: bool,
    pub auto_update: bool,
    pub loading: bool,
    pub fetched_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl LiveSnapshot {
    pub fn channel(&self) -> Option<&Channel> {
        self.channels.get(self.channel_index?)
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.channel().map(|c| c.id.as_str())
    }

    pub fn program_id(&self) -> Option<&str> {
        self.program.as_ref().map(|p| p.id.as_str())
    }
}

#[derive(Debug)]
enum Command {
    SetActiveChannel {
        channel_id: String,
        program_id: Option<String>,
        reply: oneshot::Sender<bool>,
    },
    SetAutoUpdate {
        enabled: bool,
        reply: oneshot::Sender<()>,
    },
    Refresh {
        reply: oneshot::Sender<Result<(), ScheduleError>>,
    },
}

struct Fetched {
    seq: u64,
    result: Result<Vec<Channel>, ScheduleError>,
    reply: Option<oneshot::Sender<Result<(), ScheduleError>>>,
}

/// Cheap to clone; the tracker stops once every clone is dropped.
#[derive(Clone)]
pub struct LiveChannelsHandle {
    cmd_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<LiveSnapshot>,
}

impl LiveChannelsHandle {
    pub fn snapshot(&self) -> LiveSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Select a channel, optionally pinned to one program.
    /// Resolves to `false` when the channel is unknown (selection unchanged).
    pub async fn set_active_channel(
        &self,
        channel_id: impl Into<String>,
        program_id: Option<String>,
    ) -> Result<bool, ScheduleError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SetActiveChannel {
            channel_id: channel_id.into(),
            program_id,
            reply,
        })
        .await?;
        rx.await.map_err(|_| ScheduleError::Closed)
    }

    /// Turn timed refreshes on or off. Resolves once the tracker has
    /// published the new setting.
    pub async fn set_auto_update(&self, enabled: bool) -> Result<(), ScheduleError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SetAutoUpdate { enabled, reply }).await?;
        rx.await.map_err(|_| ScheduleError::Closed)
    }

    /// Refetch now and wait for the outcome.
    pub async fn refresh(&self) -> Result<(), ScheduleError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Refresh { reply }).await?;
        rx.await.map_err(|_| ScheduleError::Closed)?
    }

    async fn send(&self, cmd: Command) -> Result<(), ScheduleError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| ScheduleError::Closed)
    }
}

pub struct LiveChannels {
    service: Arc<dyn ScheduleService>,
    clock: Arc<dyn Clock>,
    playlist: Vec<PlaylistItem>,
    cache: ScheduleCache,
    selection: Selection,
    timer: RefreshTimer,
    snapshot_tx: watch::Sender<LiveSnapshot>,
    fetch_tx: mpsc::UnboundedSender<Fetched>,
}

impl LiveChannels {
    /// Start tracking `playlist` on the current tokio runtime.
    pub fn spawn(
        service: Arc<dyn ScheduleService>,
        playlist: Vec<PlaylistItem>,
        options: LiveOptions,
        clock: Arc<dyn Clock>,
    ) -> LiveChannelsHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(LiveSnapshot {
            auto_update: options.auto_update,
            follow_live: true,
            ..LiveSnapshot::default()
        });

        let tracker = Self {
            service,
            clock,
            playlist,
            cache: ScheduleCache::new(),
            selection: Selection::new(options.initial_channel_id),
            timer: RefreshTimer::new(options.fallback_interval, options.auto_update),
            snapshot_tx,
            fetch_tx,
        };
        tokio::spawn(tracker.run(cmd_rx, fetch_rx));

        LiveChannelsHandle {
            cmd_tx,
            snapshot_rx,
        }
    }

    async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<Command>,
        mut fetch_rx: mpsc::UnboundedReceiver<Fetched>,
    ) {
        info!("[live] tracking {} channels", self.playlist.len());
        self.start_fetch(None);
        self.sync_timer();
        self.publish();

        loop {
            let deadline = self.timer.deadline();
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                Some(fetched) = fetch_rx.recv() => self.handle_fetched(fetched),
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(tokio::time::Instant::now)),
                    if deadline.is_some() =>
                {
                    debug!("[live] refresh timer fired");
                    self.timer.fired();
                    self.start_fetch(None);
                    self.publish();
                }
            }
        }

        info!("[live] tracker stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::SetActiveChannel {
                channel_id,
                program_id,
                reply,
            } => {
                let now = self.clock.now();
                let channels = Arc::clone(self.cache.channels());
                let changed = self.selection.set_active_channel(
                    &channels,
                    &channel_id,
                    program_id.as_deref(),
                    now,
                );
                if changed {
                    debug!(
                        "[live] selected {} / {:?}",
                        channel_id,
                        self.selection.active_program_id()
                    );
                    self.sync_timer();
                    self.publish();
                } else {
                    debug!("[live] ignoring unknown channel {}", channel_id);
                }
                let _ = reply.send(changed);
            }
            Command::SetAutoUpdate { enabled, reply } => {
                if enabled != self.timer.is_enabled() {
                    info!("[live] auto update {}", if enabled { "on" } else { "off" });
                    self.timer.set_enabled(enabled);
                    if enabled {
                        // The program may have ended while updates were off.
                        self.start_fetch(None);
                    }
                    self.sync_timer();
                    self.publish();
                }
                let _ = reply.send(());
            }
            Command::Refresh { reply } => {
                self.start_fetch(Some(reply));
                self.publish();
            }
        }
    }

    fn start_fetch(&mut self, reply: Option<oneshot::Sender<Result<(), ScheduleError>>>) {
        let seq = self.cache.begin_fetch();
        let fut = self.service.get_schedules(self.playlist.clone());
        let tx = self.fetch_tx.clone();
        debug!("[live] fetch #{} started", seq);
        tokio::spawn(async move {
            let result = fut.await;
            let _ = tx.send(Fetched { seq, result, reply });
        });
    }

    fn handle_fetched(&mut self, fetched: Fetched) {
        let Fetched { seq, result, reply } = fetched;
        let now = self.clock.now();

        let outcome = match result {
            Ok(channels) => {
                if self.cache.store(seq, channels, now) {
                    let channels = Arc::clone(self.cache.channels());
                    self.selection.reconcile(&channels, now);
                } else {
                    debug!("[live] dropping stale fetch #{}", seq);
                }
                Ok(())
            }
            Err(e) => {
                warn!("[live] fetch #{} failed, keeping previous schedule: {}", seq, e);
                if self.cache.record_failure(seq, &e) {
                    // Time still moved on; advance against the cached schedule.
                    let channels = Arc::clone(self.cache.channels());
                    self.selection.rederive(&channels, now);
                }
                Err(e)
            }
        };

        self.sync_timer();
        self.publish();
        if let Some(reply) = reply {
            let _ = reply.send(outcome);
        }
    }

    fn sync_timer(&mut self) {
        let now = self.clock.now();
        let channels = self.cache.channels();
        let program = self.selection.program(channels);
        if let Some(delay) = self.timer.sync(program, now) {
            debug!(
                "[live] next refresh in {}s ({:?})",
                delay.as_secs(),
                program.map(|p| p.id.as_str())
            );
        }
    }

    fn publish(&self) {
        let channels = Arc::clone(self.cache.channels());
        let snapshot = LiveSnapshot {
            channel_index: self.selection.channel_index(&channels),
            program: self.selection.program(&channels).cloned(),
            follow_live: self.selection.follows_live(),
            auto_update: self.timer.is_enabled(),
            loading: self.cache.is_loading(),
            fetched_at: self.cache.fetched_at(),
            last_error: self.cache.last_error().map(str::to_string),
            channels,
        };
        self.snapshot_tx.send_replace(snapshot);
    }
}
