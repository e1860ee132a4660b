//! Content classification: map a playlist entry to the screen that shows it.
//!
//! Classification happens once, when the playlist is loaded. Views match on
//! the resulting tag instead of probing the raw item on every render.

use serde::Serialize;

use crate::models::PlaylistItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenKind {
    Live,
    Series,
    Episode,
    Movie,
    Hub,
}

impl ScreenKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Series => "series",
            Self::Episode => "episode",
            Self::Movie => "movie",
            Self::Hub => "hub",
        }
    }

    /// Only live channels are tracked against a schedule.
    pub fn has_schedule(self) -> bool {
        matches!(self, Self::Live)
    }
}

pub fn classify(item: &PlaylistItem) -> ScreenKind {
    if let Some(kind) = item.content_type.as_deref().and_then(from_content_type) {
        return kind;
    }
    // Legacy entries carry no content type; a schedule source means live.
    if item.schedule.is_some() {
        ScreenKind::Live
    } else {
        ScreenKind::Movie
    }
}

fn from_content_type(raw: &str) -> Option<ScreenKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "live" | "livechannel" | "live_channel" => Some(ScreenKind::Live),
        "series" => Some(ScreenKind::Series),
        "episode" => Some(ScreenKind::Episode),
        "movie" | "video" => Some(ScreenKind::Movie),
        "hub" | "playlist" => Some(ScreenKind::Hub),
        _ => None,
    }
}
