//! Active selection: which channel and program drive the guide and player.

use chrono::{DateTime, Utc};

use crate::models::{Channel, Program};

/// `{ active_channel_id, active_program_id }` plus whether the program is
/// derived from the clock (`follow_live`) or pinned by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    active_channel_id: Option<String>,
    active_program_id: Option<String>,
    follow_live: bool,
}

impl Selection {
    pub fn new(initial_channel_id: Option<String>) -> Self {
        Self {
            active_channel_id: initial_channel_id,
            active_program_id: None,
            follow_live: true,
        }
    }

    pub fn active_channel_id(&self) -> Option<&str> {
        self.active_channel_id.as_deref()
    }

    pub fn active_program_id(&self) -> Option<&str> {
        self.active_program_id.as_deref()
    }

    pub fn follows_live(&self) -> bool {
        self.follow_live
    }

    /// The active channel, or the first one when none (or an unknown one) is set.
    pub fn channel<'a>(&self, channels: &'a [Channel]) -> Option<&'a Channel> {
        self.active_channel_id
            .as_deref()
            .and_then(|id| channels.iter().find(|c| c.id == id))
            .or_else(|| channels.first())
    }

    pub fn channel_index(&self, channels: &[Channel]) -> Option<usize> {
        let channel = self.channel(channels)?;
        channels.iter().position(|c| c.id == channel.id)
    }

    pub fn program<'a>(&self, channels: &'a [Channel]) -> Option<&'a Program> {
        let channel = self.channel(channels)?;
        channel.find_program(self.active_program_id.as_deref()?)
    }

    /// Select `channel_id`, either following whatever is live or pinned to
    /// `program_id`. Unknown channels leave the selection untouched and
    /// return false.
    pub fn set_active_channel(
        &mut self,
        channels: &[Channel],
        channel_id: &str,
        program_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(channel) = channels.iter().find(|c| c.id == channel_id) else {
            return false;
        };

        self.active_channel_id = Some(channel.id.clone());
        match program_id {
            None => {
                self.follow_live = true;
                self.active_program_id = channel.live_program(now).map(|p| p.id.clone());
            }
            Some(program_id) => {
                // Pinning the program that is on air is the same as watching live.
                self.follow_live = channel
                    .find_program(program_id)
                    .is_some_and(|p| p.is_live(now));
                self.active_program_id = Some(program_id.to_string());
            }
        }
        true
    }

    /// Bring the selection in line with a freshly fetched schedule.
    pub fn reconcile(&mut self, channels: &[Channel], now: DateTime<Utc>) {
        if let Some(id) = self.active_channel_id.as_deref() {
            if !channels.iter().any(|c| c.id == id) {
                // The fallback channel starts out live; a program id pinned
                // on the old channel means nothing there.
                self.active_channel_id = None;
                self.active_program_id = None;
                self.follow_live = true;
            }
        }
        self.rederive(channels, now);
    }

    /// Recompute the program for `now`. A live-following selection moves to
    /// whatever is on air; a pinned program is kept while it still exists.
    pub fn rederive(&mut self, channels: &[Channel], now: DateTime<Utc>) {
        let channel = self.channel(channels);
        if self.follow_live {
            self.active_program_id = channel
                .and_then(|c| c.live_program(now))
                .map(|p| p.id.clone());
        } else if let Some(program_id) = self.active_program_id.as_deref() {
            if channel.and_then(|c| c.find_program(program_id)).is_none() {
                self.active_program_id = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_schedule, PlaylistItem};

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn channel(id: &str, json: &str) -> Channel {
        let item = PlaylistItem {
            id: id.to_string(),
            title: id.to_string(),
            catchup_hours: 24,
            schedule: None,
            content_type: None,
            image: None,
        };
        Channel::new(&item, parse_schedule(id, json).unwrap())
    }

    fn fixture() -> Vec<Channel> {
        vec![
            channel("channel1", include_str!("../../tests/fixtures/channel1.json")),
            channel("channel2", include_str!("../../tests/fixtures/channel2.json")),
        ]
    }

    fn ids<'a>(sel: &Selection, channels: &'a [Channel]) -> (Option<&'a str>, Option<&'a str>) {
        (
            sel.channel(channels).map(|c| c.id.as_str()),
            sel.program(channels).map(|p| p.id.as_str()),
        )
    }

    #[test]
    fn test_empty_schedule() {
        let mut sel = Selection::new(None);
        sel.reconcile(&[], at("2022-07-15T10:45:00Z"));
        assert_eq!(ids(&sel, &[]), (None, None));
    }

    #[test]
    fn test_default_and_initial_channel() {
        let channels = fixture();
        let now = at("2022-07-15T10:45:00Z");

        let mut sel = Selection::new(None);
        sel.reconcile(&channels, now);
        assert_eq!(ids(&sel, &channels), (Some("channel1"), Some("program2")));

        let mut sel = Selection::new(Some("channel2".to_string()));
        sel.reconcile(&channels, now);
        assert_eq!(ids(&sel, &channels), (Some("channel2"), Some("program5")));

        let mut sel = Selection::new(Some("nope".to_string()));
        sel.reconcile(&channels, now);
        assert_eq!(sel.active_channel_id(), None);
        assert_eq!(ids(&sel, &channels), (Some("channel1"), Some("program2")));
    }

    #[test]
    fn test_schedule_out_of_range_is_not_clamped() {
        let channels = fixture();
        let mut sel = Selection::new(None);
        sel.reconcile(&channels, at("2022-07-15T18:00:00Z"));
        assert_eq!(ids(&sel, &channels), (Some("channel1"), None));
    }

    #[test]
    fn test_set_active_channel() {
        let channels = fixture();
        let now = at("2022-07-15T10:45:00Z");
        let mut sel = Selection::new(None);
        sel.reconcile(&channels, now);

        assert!(sel.set_active_channel(&channels, "channel2", None, now));
        assert_eq!(ids(&sel, &channels), (Some("channel2"), Some("program5")));
        assert!(sel.follows_live());

        assert!(sel.set_active_channel(&channels, "channel1", Some("program1"), now));
        assert_eq!(ids(&sel, &channels), (Some("channel1"), Some("program1")));
        assert!(!sel.follows_live());

        let before = sel.clone();
        assert!(!sel.set_active_channel(&channels, "channel3", Some("program5"), now));
        assert_eq!(sel, before);
    }

    #[test]
    fn test_pinned_program_survives_rederive() {
        let channels = fixture();
        let mut sel = Selection::new(None);
        sel.set_active_channel(&channels, "channel1", Some("program1"), at("2022-07-15T10:45:00Z"));
        sel.rederive(&channels, at("2022-07-15T11:30:00Z"));
        assert_eq!(sel.active_program_id(), Some("program1"));
    }

    #[test]
    fn test_pinning_live_program_keeps_following() {
        let channels = fixture();
        let mut sel = Selection::new(None);
        sel.set_active_channel(&channels, "channel1", Some("program2"), at("2022-07-15T10:45:00Z"));
        assert!(sel.follows_live());
        sel.rederive(&channels, at("2022-07-15T11:00:00Z"));
        assert_eq!(sel.active_program_id(), Some("program3"));
    }

    #[test]
    fn test_reconcile_drops_vanished_entries() {
        let channels = fixture();
        let now = at("2022-07-15T10:45:00Z");
        let mut sel = Selection::new(None);
        sel.set_active_channel(&channels, "channel2", Some("program4"), now);

        // channel2 disappears: fall back to the first channel, live.
        let replaced = vec![channels[0].clone()];
        sel.reconcile(&replaced, now);
        assert_eq!(sel.active_channel_id(), None);
        assert_eq!(ids(&sel, &replaced), (Some("channel1"), Some("program2")));
        assert!(sel.follows_live());
    }

    #[test]
    fn test_removed_channel_ignores_same_program_id_elsewhere() {
        let now = at("2022-07-15T10:45:00Z");
        let channels = vec![
            channel(
                "channel1",
                r#"[
                    {"id": "shared", "title": "Early", "startTime": "2022-07-15T08:00:00Z", "endTime": "2022-07-15T09:00:00Z"},
                    {"id": "morning", "title": "Morning", "startTime": "2022-07-15T10:00:00Z", "endTime": "2022-07-15T11:00:00Z"}
                ]"#,
            ),
            channel(
                "channel2",
                r#"[
                    {"id": "shared", "title": "Late", "startTime": "2022-07-15T09:00:00Z", "endTime": "2022-07-15T10:00:00Z"}
                ]"#,
            ),
        ];
        let mut sel = Selection::new(None);
        assert!(sel.set_active_channel(&channels, "channel2", Some("shared"), now));
        assert!(!sel.follows_live());

        let replaced = vec![channels[0].clone()];
        sel.reconcile(&replaced, now);
        assert_eq!(ids(&sel, &replaced), (Some("channel1"), Some("morning")));
        assert!(sel.follows_live());
    }
}
