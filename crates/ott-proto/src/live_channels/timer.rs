//! Single-shot refresh timer keyed on the active program.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::models::Program;

/// Identity of the program the timer was armed for.
type ArmKey = Option<(String, DateTime<Utc>)>;

#[derive(Debug)]
pub struct RefreshTimer {
    enabled: bool,
    fallback: Duration,
    armed: Option<(ArmKey, Instant)>,
}

impl RefreshTimer {
    pub fn new(fallback: Duration, enabled: bool) -> Self {
        Self {
            enabled,
            fallback,
            armed: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.as_ref().map(|(_, at)| *at)
    }

    /// Time until the next refresh: the end of `program` when it is still
    /// running, capped by the fallback interval.
    pub fn delay(&self, program: Option<&Program>, now: DateTime<Utc>) -> Duration {
        program
            .and_then(|p| (p.end_time - now).to_std().ok())
            .filter(|left| !left.is_zero())
            .map_or(self.fallback, |left| left.min(self.fallback))
    }

    /// Arm for `program` unless already armed for the same id and end time.
    /// Returns the new delay when the timer was (re)armed.
    pub fn sync(&mut self, program: Option<&Program>, now: DateTime<Utc>) -> Option<Duration> {
        if !self.enabled {
            self.armed = None;
            return None;
        }
        let key: ArmKey = program.map(|p| (p.id.clone(), p.end_time));
        if matches!(&self.armed, Some((armed_key, _)) if *armed_key == key) {
            return None;
        }
        let delay = self.delay(program, now);
        self.armed = Some((key, Instant::now() + delay));
        Some(delay)
    }

    /// Clear after firing so the next `sync` re-arms even for the same program.
    pub fn fired(&mut self) {
        self.armed = None;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.armed = None;
    }
}
