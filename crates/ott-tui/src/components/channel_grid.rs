//! ChannelGrid — one card per live channel, navigated with the arrow keys.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use ott_proto::models::Channel;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    layout_grid::LayoutGrid,
    theme::{
        style_focused_border, style_muted, style_secondary, style_unfocused_border, C_LIVE,
        C_MUTED, C_PRIMARY,
    },
    widgets::{pane_chrome::pane_chrome, progress_bar::fmt_clock},
};

const CARD_HEIGHT: u16 = 4;

pub struct ChannelGrid {
    grid: LayoutGrid,
    /// Active channel the cursor was last moved to.
    followed: Option<String>,
    scroll_row: usize,
}

impl ChannelGrid {
    pub fn new() -> Self {
        Self {
            grid: LayoutGrid::new(0, 1),
            followed: None,
            scroll_row: 0,
        }
    }

    /// Track the channel list; jump to the active channel when it changes.
    fn sync(&mut self, state: &AppState) {
        self.grid.set_item_count(state.live.channels.len());
        let active = state.live.channel_id();
        if active != self.followed.as_deref() {
            self.followed = active.map(str::to_string);
            if let Some(index) = state.live.channel_index {
                self.grid.focus_index(index);
            }
        }
    }

    fn columns_for(width: u16, card_width: u16) -> usize {
        usize::from(width / card_width.max(1)).max(1)
    }

    fn draw_card(
        frame: &mut Frame,
        area: Rect,
        channel: &Channel,
        state: &AppState,
        has_cursor: bool,
        active: bool,
    ) {
        let border = if has_cursor {
            style_focused_border()
        } else if active {
            Style::default().fg(C_LIVE)
        } else {
            style_unfocused_border()
        };
        let title_style = if active {
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(C_PRIMARY)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Span::styled(channel.title.as_str(), title_style));

        let lines = match channel.live_program(state.now) {
            Some(program) => vec![
                Line::from(Span::styled(program.title.as_str(), style_secondary())),
                Line::from(Span::styled(
                    format!(
                        "{}–{}",
                        fmt_clock(program.start_time),
                        fmt_clock(program.end_time)
                    ),
                    style_muted(),
                )),
            ],
            None if channel.is_outdated(state.now) => {
                vec![Line::from(Span::styled("no schedule", style_muted()))]
            }
            None => vec![Line::from(Span::styled("off air", style_muted()))],
        };
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

impl Default for ChannelGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for ChannelGrid {
    fn id(&self) -> ComponentId {
        ComponentId::ChannelGrid
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        if self.grid.handle_key(key).is_some() {
            return vec![];
        }
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => self
                .grid
                .focused()
                .and_then(|i| state.live.channels.get(i))
                .map(|c| vec![Action::SelectChannel(c.id.clone())])
                .unwrap_or_default(),
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        if let Action::LiveUpdated = action {
            self.sync(state);
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let count = state.live.channels.len();
        let title = format!("channels ({})", count);
        let block = pane_chrome(&title, Some('1'), focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if count == 0 {
            let text = if state.live.loading {
                "loading guide…"
            } else {
                "no live channels"
            };
            frame.render_widget(
                Paragraph::new(Span::styled(text, Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        let columns = Self::columns_for(inner.width, state.card_width);
        self.grid.resize(columns);

        // Keep the cursor row on screen.
        let visible_rows = usize::from((inner.height / CARD_HEIGHT).max(1));
        let (cursor_row, _) = self.grid.cursor();
        if cursor_row < self.scroll_row {
            self.scroll_row = cursor_row;
        } else if cursor_row >= self.scroll_row + visible_rows {
            self.scroll_row = cursor_row + 1 - visible_rows;
        }

        let card_width = inner.width / columns as u16;
        let cursor = self.grid.focused();
        let first = self.scroll_row * columns;
        let last = (first + visible_rows * columns).min(count);
        for (index, channel) in state.live.channels[first..last].iter().enumerate() {
            let index = first + index;
            let (row, column) = ((index - first) / columns, index % columns);
            let card = Rect {
                x: inner.x + column as u16 * card_width,
                y: inner.y + row as u16 * CARD_HEIGHT,
                width: card_width,
                height: CARD_HEIGHT.min(inner.height.saturating_sub(row as u16 * CARD_HEIGHT)),
            };
            Self::draw_card(
                frame,
                card,
                channel,
                state,
                focused && cursor == Some(index),
                state.live.channel_index == Some(index),
            );
        }
    }
}
