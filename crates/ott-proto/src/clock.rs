//! Wall-clock sources for the live tracker.

use chrono::{DateTime, Utc};
use tokio::time::Instant;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Plain system wall time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall time anchored at `wall` when the clock was created and advanced by
/// the tokio monotonic clock since then.
///
/// Under a paused tokio runtime this clock moves exactly as far as
/// `tokio::time::advance`, so timers and "now" stay in step.
#[derive(Debug, Clone, Copy)]
pub struct AnchoredClock {
    wall: DateTime<Utc>,
    anchor: Instant,
}

impl AnchoredClock {
    pub fn new(wall: DateTime<Utc>) -> Self {
        Self {
            wall,
            anchor: Instant::now(),
        }
    }
}

impl Clock for AnchoredClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = Instant::now().saturating_duration_since(self.anchor);
        match chrono::Duration::from_std(elapsed) {
            Ok(d) => self.wall + d,
            Err(_) => self.wall,
        }
    }
}
