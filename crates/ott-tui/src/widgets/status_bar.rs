//! Status bar — bottom line with refresh state and keybindings.

use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app_state::AppState;
use crate::theme::{C_ACCENT, C_LIVE, C_LOADING, C_MODE, C_MUTED, C_SECONDARY};

const KEYS: &str =
    " ←→↑↓ move  Enter watch  l live  a auto-update  r refresh  Tab/1-2 panes  ? help  q quit";

pub fn draw_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
    let [left, right] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(36)]).areas(area);

    let (dot, dot_color) = if state.live.auto_update {
        ("●", C_LIVE)
    } else {
        ("○", C_MUTED)
    };
    let line = Line::from(vec![
        Span::styled(" EPG ", Style::default().fg(C_MODE).add_modifier(Modifier::BOLD)),
        Span::styled(dot, Style::default().fg(dot_color).add_modifier(Modifier::BOLD)),
        Span::styled(KEYS, Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), left);

    frame.render_widget(
        Paragraph::new(Line::from(fetch_status(state)).right_aligned()),
        right,
    );
}

fn fetch_status(state: &AppState) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    if state.live.loading {
        spans.push(Span::styled("updating… ", Style::default().fg(C_LOADING)));
    } else if state.live.last_error.is_some() {
        spans.push(Span::styled("update failed ", Style::default().fg(C_ACCENT)));
    }
    if let Some(at) = state.live.fetched_at {
        spans.push(Span::styled(
            format!("guide {} ", fmt_time(at)),
            Style::default().fg(C_SECONDARY),
        ));
    }
    if let Some(addr) = &state.http_addr {
        spans.push(Span::styled(format!("{} ", addr), Style::default().fg(C_MUTED)));
    }
    spans
}

fn fmt_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}
