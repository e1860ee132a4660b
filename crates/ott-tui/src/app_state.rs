//! AppState — read-only data shared with every component.

use chrono::{DateTime, Utc};
use ott_proto::live_channels::LiveSnapshot;

pub struct AppState {
    /// Latest snapshot published by the tracker.
    pub live: LiveSnapshot,
    /// Wall clock, refreshed every UI tick.
    pub now: DateTime<Utc>,
    /// Address of the local HTTP API when it is enabled.
    pub http_addr: Option<String>,
    pub card_width: u16,
}

impl AppState {
    pub fn new(live: LiveSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            live,
            now,
            http_addr: None,
            card_width: 28,
        }
    }
}
