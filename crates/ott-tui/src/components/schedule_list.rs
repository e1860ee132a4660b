//! ScheduleList — programs of the active channel with live / catch-up markers.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};

use ott_proto::models::{Channel, Program};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        style_default, style_muted, style_selected, style_selected_focused, C_CATCHUP, C_LIVE,
        C_UPCOMING,
    },
    widgets::{pane_chrome::pane_chrome, progress_bar::fmt_clock},
};

const PAGE: usize = 10;

pub struct ScheduleList {
    list_state: ListState,
    /// `(channel id, program id)` the cursor last jumped to.
    followed: (Option<String>, Option<String>),
}

impl ScheduleList {
    pub fn new() -> Self {
        Self {
            list_state: ListState::default(),
            followed: (None, None),
        }
    }

    /// Put the cursor on the active program whenever the selection moves.
    fn sync(&mut self, state: &AppState) {
        let Some(channel) = state.live.channel() else {
            self.list_state.select(None);
            self.followed = (None, None);
            return;
        };
        let key = (
            Some(channel.id.clone()),
            state.live.program_id().map(str::to_string),
        );
        if key != self.followed {
            let target = state
                .live
                .program_id()
                .and_then(|id| channel.programs.iter().position(|p| p.id == id))
                .or_else(|| {
                    let live = channel.live_program(state.now)?;
                    channel.programs.iter().position(|p| p.id == live.id)
                });
            self.list_state.select(target.or(Some(0)));
            self.followed = key;
        }
        self.clamp(channel.programs.len());
    }

    fn clamp(&mut self, len: usize) {
        match (self.list_state.selected(), len) {
            (_, 0) => self.list_state.select(None),
            (Some(i), len) if i >= len => self.list_state.select(Some(len - 1)),
            (None, _) => self.list_state.select(Some(0)),
            _ => {}
        }
    }

    fn move_by(&mut self, delta: isize, len: usize) {
        if len == 0 {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.list_state.select(Some(next as usize));
    }

    fn watch(&self, channel: &Channel, state: &AppState) -> Vec<Action> {
        let Some(program) = self
            .list_state
            .selected()
            .and_then(|i| channel.programs.get(i))
        else {
            return vec![];
        };
        match channel.check_watchable(program, state.now) {
            Ok(()) => vec![Action::PinProgram {
                channel_id: channel.id.clone(),
                program_id: program.id.clone(),
            }],
            Err(code) => vec![Action::Notify(code)],
        }
    }

    fn row<'a>(program: &'a Program, channel: &Channel, state: &AppState) -> ListItem<'a> {
        let active = state.live.program_id() == Some(program.id.as_str());
        let (marker, color, dim) = if program.is_live(state.now) {
            ("●", C_LIVE, false)
        } else if program.is_catchup(state.now, channel.catchup_hours) {
            ("↺", C_CATCHUP, false)
        } else {
            (" ", C_UPCOMING, true)
        };
        let title_style = if active {
            style_default().fg(color).add_modifier(Modifier::BOLD)
        } else if dim {
            style_muted()
        } else {
            style_default()
        };
        ListItem::new(Line::from(vec![
            Span::styled(format!(" {} ", marker), Style::default().fg(color)),
            Span::styled(
                format!(
                    "{}–{} ",
                    fmt_clock(program.start_time),
                    fmt_clock(program.end_time)
                ),
                style_muted(),
            ),
            Span::styled(program.title.as_str(), title_style),
        ]))
    }
}

impl Default for ScheduleList {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for ScheduleList {
    fn id(&self) -> ComponentId {
        ComponentId::Schedule
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let Some(channel) = state.live.channel() else {
            return vec![];
        };
        let len = channel.programs.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.move_by(-1, len),
            KeyCode::Down | KeyCode::Char('j') => self.move_by(1, len),
            KeyCode::PageUp => self.move_by(-(PAGE as isize), len),
            KeyCode::PageDown => self.move_by(PAGE as isize, len),
            KeyCode::Home | KeyCode::Char('g') => self.move_by(-(len as isize), len),
            KeyCode::End | KeyCode::Char('G') => self.move_by(len as isize, len),
            KeyCode::Enter | KeyCode::Char(' ') => return self.watch(channel, state),
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        if let Action::LiveUpdated = action {
            self.sync(state);
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let title = state
            .live
            .channel()
            .map_or_else(|| "schedule".to_string(), |c| format!("schedule · {}", c.title));
        let block = pane_chrome(&title, Some('2'), focused, None);

        let Some(channel) = state.live.channel().filter(|c| !c.programs.is_empty()) else {
            frame.render_widget(
                Paragraph::new(Span::styled("no programs", style_muted())).block(block),
                area,
            );
            return;
        };

        let items: Vec<ListItem> = channel
            .programs
            .iter()
            .map(|p| Self::row(p, channel, state))
            .collect();
        let highlight = if focused {
            style_selected_focused()
        } else {
            style_selected()
        };
        let list = List::new(items).block(block).highlight_style(highlight);
        frame.render_stateful_widget(list, area, &mut self.list_state);
    }
}
