//! NowPlaying — header pane describing the active channel and program.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use ott_proto::models::Program;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        style_muted, style_secondary, C_BADGE_ERR, C_BADGE_LIVE, C_BADGE_PENDING, C_CATCHUP,
        C_PRIMARY,
    },
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        progress_bar::{draw_program_progress, fmt_clock},
    },
};

/// What the player is showing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Airing {
    Live,
    CatchUp,
    /// Live selection whose program is over and has not been replaced,
    /// e.g. with auto update off.
    Ended,
    /// Live selection, but nothing in the guide covers `now`.
    OffAir,
    /// The guide for this channel has run out.
    Outdated,
}

impl Airing {
    pub fn of(state: &AppState) -> Option<Self> {
        let channel = state.live.channel()?;
        Some(match &state.live.program {
            Some(p) if p.is_live(state.now) => Self::Live,
            Some(_) if state.live.follow_live => Self::Ended,
            Some(_) => Self::CatchUp,
            None if channel.is_outdated(state.now) => Self::Outdated,
            None => Self::OffAir,
        })
    }

    fn badge(self) -> Badge<'static> {
        match self {
            Self::Live => Badge {
                text: "LIVE",
                color: C_BADGE_LIVE,
            },
            Self::CatchUp => Badge {
                text: "CATCH-UP",
                color: C_CATCHUP,
            },
            Self::Ended => Badge {
                text: "ENDED",
                color: C_BADGE_PENDING,
            },
            Self::OffAir => Badge {
                text: "OFF AIR",
                color: C_BADGE_PENDING,
            },
            Self::Outdated => Badge {
                text: "NO GUIDE",
                color: C_BADGE_ERR,
            },
        }
    }
}

pub struct NowPlaying;

impl NowPlaying {
    pub fn new() -> Self {
        Self
    }

    fn program_lines<'a>(program: &'a Program, airing: Airing) -> Vec<Line<'a>> {
        let minutes = program.duration().num_minutes();
        let when = match airing {
            Airing::CatchUp => format!(
                "aired {}–{} · {} min",
                fmt_clock(program.start_time),
                fmt_clock(program.end_time),
                minutes
            ),
            Airing::Ended => format!("ended {} · press r to refresh", fmt_clock(program.end_time)),
            _ => format!("{} min", minutes),
        };
        vec![
            Line::from(Span::styled(
                program.title.as_str(),
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(when, style_muted())),
        ]
    }
}

impl Default for NowPlaying {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for NowPlaying {
    fn id(&self) -> ComponentId {
        ComponentId::NowPlaying
    }

    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        let Some(channel) = state.live.channel() else {
            let block = pane_chrome("now playing", None, false, None);
            frame.render_widget(
                Paragraph::new(Span::styled("no channel selected", style_muted())).block(block),
                area,
            );
            return;
        };
        let airing = Airing::of(state);
        let block = pane_chrome(&channel.title, None, false, airing.map(Airing::badge));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(program) = &state.live.program else {
            let text = match airing {
                Some(Airing::Outdated) => "the guide for this channel has run out",
                _ => "nothing scheduled right now",
            };
            frame.render_widget(Paragraph::new(Span::styled(text, style_muted())), inner);
            return;
        };
        let airing = airing.unwrap_or(Airing::Live);

        let [heading, progress, description] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .areas(inner);

        frame.render_widget(Paragraph::new(Self::program_lines(program, airing)), heading);
        if airing == Airing::Live {
            draw_program_progress(frame, progress, program, state.now);
        }
        if !program.description.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(program.description.as_str(), style_secondary()))
                    .wrap(Wrap { trim: true }),
                description,
            );
        }
    }
}
