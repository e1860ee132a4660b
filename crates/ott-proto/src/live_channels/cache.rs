//! Schedule cache: the last good set of channels plus fetch bookkeeping.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::ScheduleError;
use crate::models::Channel;

#[derive(Debug, Default)]
pub struct ScheduleCache {
    channels: Arc<Vec<Channel>>,
    /// Sequence number handed to the most recently started fetch.
    started: u64,
    /// Sequence number of the most recently completed fetch (ok or not).
    completed: u64,
    fetched_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl ScheduleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channels(&self) -> &Arc<Vec<Channel>> {
        &self.channels
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.completed < self.started
    }

    /// Allocate the sequence number for a new fetch.
    pub fn begin_fetch(&mut self) -> u64 {
        self.started += 1;
        self.started
    }

    /// A result is stale when a fetch started after it has already completed.
    pub fn is_stale(&self, seq: u64) -> bool {
        seq <= self.completed
    }

    /// Replace the cached channels wholesale. Returns false for stale results.
    pub fn store(&mut self, seq: u64, channels: Vec<Channel>, now: DateTime<Utc>) -> bool {
        if self.is_stale(seq) {
            return false;
        }
        self.completed = seq;
        self.channels = Arc::new(channels);
        self.fetched_at = Some(now);
        self.last_error = None;
        true
    }

    /// Record a failed fetch; the previous channels stay available.
    pub fn record_failure(&mut self, seq: u64, err: &ScheduleError) -> bool {
        if self.is_stale(seq) {
            return false;
        }
        self.completed = seq;
        self.last_error = Some(err.to_string());
        true
    }
}
