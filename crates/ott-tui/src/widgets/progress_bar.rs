//! Smooth Unicode progress bar for the program on air.

use chrono::{DateTime, Local, Utc};
use ott_proto::models::Program;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_LIVE, C_MUTED, C_SECONDARY};

const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

/// Fraction of `program` that has aired at `now`, in `0.0..=1.0`.
pub fn program_progress(program: &Program, now: DateTime<Utc>) -> f64 {
    let total = (program.end_time - program.start_time).num_seconds();
    if total <= 0 {
        return 1.0;
    }
    let elapsed = (now - program.start_time).num_seconds();
    (elapsed as f64 / total as f64).clamp(0.0, 1.0)
}

/// `HH:MM` in the local timezone.
pub fn fmt_clock(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

/// `start  ████▌     end` for `program`.
pub fn draw_program_progress(frame: &mut Frame, area: Rect, program: &Program, now: DateTime<Utc>) {
    if area.width < 4 || area.height == 0 {
        return;
    }

    let left_label = fmt_clock(program.start_time);
    let right_label = fmt_clock(program.end_time);
    let label_w = (left_label.len() + right_label.len() + 2) as u16;
    let bar_w = area.width.saturating_sub(label_w).max(4) as usize;

    let spans = vec![
        Span::styled(format!("{} ", left_label), Style::default().fg(C_SECONDARY)),
        Span::styled(
            smooth_bar(program_progress(program, now), bar_w),
            Style::default().fg(C_LIVE),
        ),
        Span::styled(format!(" {}", right_label), Style::default().fg(C_MUTED)),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Eight sub-steps per cell.
fn smooth_bar(progress: f64, width: usize) -> String {
    let eighths = (progress.clamp(0.0, 1.0) * width as f64 * 8.0) as usize;
    let full = (eighths / 8).min(width);
    let mut bar = "█".repeat(full);
    if full < width {
        bar.push(BLOCKS[eighths % 8]);
        bar.push_str(&" ".repeat(width - full - 1));
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn program(start: &str, end: &str) -> Program {
        Program {
            id: "p".to_string(),
            title: "p".to_string(),
            description: String::new(),
            start_time: at(start),
            end_time: at(end),
            channel_id: "c".to_string(),
        }
    }

    #[test]
    fn test_program_progress() {
        let p = program("2022-07-15T10:00:00Z", "2022-07-15T11:00:00Z");
        assert_eq!(program_progress(&p, at("2022-07-15T09:00:00Z")), 0.0);
        assert_eq!(program_progress(&p, at("2022-07-15T10:15:00Z")), 0.25);
        assert_eq!(program_progress(&p, at("2022-07-15T12:00:00Z")), 1.0);
    }

    #[test]
    fn test_zero_length_program_is_complete() {
        let p = program("2022-07-15T10:00:00Z", "2022-07-15T10:00:00Z");
        assert_eq!(program_progress(&p, at("2022-07-15T09:00:00Z")), 1.0);
    }

    #[test]
    fn test_smooth_bar_width() {
        for progress in [0.0, 0.13, 0.5, 0.99, 1.0] {
            assert_eq!(smooth_bar(progress, 10).chars().count(), 10);
        }
        assert_eq!(smooth_bar(1.0, 4), "████");
        assert_eq!(smooth_bar(0.5, 4), "██  ");
    }
}
