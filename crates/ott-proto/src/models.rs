//! Channel / program data model and schedule document parsing.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A channel descriptor as listed in the playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub id: String,
    pub title: String,
    /// Hours of rewindable history after a program has aired.
    #[serde(default)]
    pub catchup_hours: u32,
    /// URL or local file path of the channel's schedule document.
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A channel together with its fetched schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    pub id: String,
    pub title: String,
    pub catchup_hours: u32,
    /// Ordered by `start_time`, non-overlapping.
    pub programs: Vec<Program>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub channel_id: String,
}

impl Program {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now < self.end_time
    }

    /// Aired already and still inside the channel's catch-up window.
    pub fn is_catchup(&self, now: DateTime<Utc>, catchup_hours: u32) -> bool {
        catchup_hours > 0
            && self.end_time <= now
            && self.end_time > now - Duration::hours(i64::from(catchup_hours))
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.start_time > now
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }
}

impl Channel {
    /// Build a channel from its playlist descriptor and parsed programs.
    pub fn new(item: &PlaylistItem, programs: Vec<Program>) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            catchup_hours: item.catchup_hours,
            programs,
        }
    }

    /// The program airing at `now`. `None` for gaps and for times outside
    /// the fetched range; never clamped to the nearest program.
    pub fn live_program(&self, now: DateTime<Utc>) -> Option<&Program> {
        // Programs are sorted, so the candidate is the last one starting at or before `now`.
        let idx = self.programs.partition_point(|p| p.start_time <= now);
        idx.checked_sub(1)
            .map(|i| &self.programs[i])
            .filter(|p| p.is_live(now))
    }

    pub fn find_program(&self, id: &str) -> Option<&Program> {
        self.programs.iter().find(|p| p.id == id)
    }

    /// True when nothing in the schedule is live or upcoming any more.
    pub fn is_outdated(&self, now: DateTime<Utc>) -> bool {
        self.programs.last().map_or(true, |p| p.end_time <= now)
    }

    /// Whether `program` can be watched at `now`: on air, or aired and
    /// still inside the catch-up window. The error is a message code.
    pub fn check_watchable(&self, program: &Program, now: DateTime<Utc>) -> Result<(), &'static str> {
        if program.is_upcoming(now) {
            Err("not_aired")
        } else if program.is_live(now) || program.is_catchup(now, self.catchup_hours) {
            Ok(())
        } else {
            Err("not_in_catchup")
        }
    }
}

// ── Schedule documents ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProgram {
    id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
}

/// Parse a schedule document (a JSON array of programs) for `channel_id`.
///
/// Entries with missing fields, unparsable timestamps or an empty time range
/// are dropped. The result is sorted by start time with overlaps removed.
pub fn parse_schedule(channel_id: &str, json: &str) -> serde_json::Result<Vec<Program>> {
    let raw: Vec<RawProgram> = serde_json::from_str(json)?;
    let total = raw.len();

    let mut programs: Vec<Program> = raw
        .into_iter()
        .filter_map(|r| program_from_raw(channel_id, r))
        .collect();
    programs.sort_by_key(|p| p.start_time);

    let mut schedule: Vec<Program> = Vec::with_capacity(programs.len());
    for program in programs {
        if let Some(prev) = schedule.last() {
            if program.start_time < prev.end_time {
                warn!(
                    "[schedule] {}: dropping {} (overlaps {})",
                    channel_id, program.id, prev.id
                );
                continue;
            }
        }
        schedule.push(program);
    }

    if schedule.len() != total {
        warn!(
            "[schedule] {}: kept {} of {} entries",
            channel_id,
            schedule.len(),
            total
        );
    }
    Ok(schedule)
}

fn program_from_raw(channel_id: &str, raw: RawProgram) -> Option<Program> {
    let parse_ts = |s: &Option<String>| {
        s.as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    };
    let start_time = parse_ts(&raw.start_time);
    let end_time = parse_ts(&raw.end_time);

    match (raw.id, raw.title, start_time, end_time) {
        (Some(id), Some(title), Some(start_time), Some(end_time)) if start_time < end_time => {
            Some(Program {
                id,
                title,
                description: raw.description.unwrap_or_default().trim().to_string(),
                start_time,
                end_time,
                channel_id: channel_id.to_string(),
            })
        }
        (id, ..) => {
            warn!(
                "[schedule] {}: invalid entry {:?}",
                channel_id,
                id.as_deref().unwrap_or("<no id>")
            );
            None
        }
    }
}
