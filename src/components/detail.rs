use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::calendar::{CalendarEvent, EventStatus};
use crate::theme;

/// Default display for an activated event when no callback is configured.
pub struct DetailPopup;

impl DetailPopup {
    pub fn render(frame: &mut Frame, area: Rect, ev: &CalendarEvent, feed_color: Color) {
        let popup_area = super::popup_area(area, 60, 16);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!(" {} ", ev.title))
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let dim = theme::current().dim;
        let mut lines: Vec<Line> = Vec::new();

        lines.push(Line::from(vec![
            Span::styled("Date: ", dim),
            Span::raw(ev.start.format("%A, %B %d, %Y").to_string()),
        ]));

        if ev.is_all_day {
            let last = ev.end.date().pred_opt().unwrap_or(ev.end.date());
            if last > ev.start.date() {
                lines.push(Line::from(vec![
                    Span::styled("Until: ", dim),
                    Span::raw(last.format("%A, %B %d, %Y").to_string()),
                ]));
            } else {
                lines.push(Line::from(Span::styled("All day", dim)));
            }
        } else {
            lines.push(Line::from(vec![
                Span::styled("Time: ", dim),
                Span::raw(ev.duration_display()),
            ]));
        }

        if ev.status == EventStatus::Tentative {
            lines.push(Line::from(Span::styled("Tentative", dim)));
        }

        if let Some(ref loc) = ev.location {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("Location: ", dim),
                Span::raw(loc.clone()),
            ]));
        }

        if let Some(ref notes) = ev.notes {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Notes:", dim)));
            for line in notes.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }

        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("  ", Style::default().bg(feed_color)),
            Span::styled(" Press Esc to close", dim),
        ]));

        let para = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(para, inner);
    }
}
