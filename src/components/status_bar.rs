use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::layout::ViewMode;
use crate::theme;

const MONTH_HINTS: &str = " arrows:Nav [/]:Month t:Today y:Year Tab:Item Enter:Open ?:Help q:Quit";
const WEEK_HINTS: &str = " arrows:Nav [/]:Week t:Today Tab:Item Enter:Open ?:Help q:Quit";

pub struct StatusBar;

impl StatusBar {
    /// `message` wins over the key hints when present.
    pub fn render(frame: &mut Frame, area: Rect, mode: ViewMode, message: Option<&str>) {
        let w = area.width as usize;
        let status = theme::current().status;

        let mode_str = match mode {
            ViewMode::Month => "[m]Month",
            ViewMode::Week => "[w]Week",
        };

        let right_text = match message.filter(|m| !m.trim().is_empty()) {
            Some(msg) => format!(" {} ", msg.trim()),
            None if w >= 80 => match mode {
                ViewMode::Month => MONTH_HINTS.to_string(),
                ViewMode::Week => WEEK_HINTS.to_string(),
            },
            None if w >= 50 => " [/]:Prev/Next Enter:Open ?:Help q:Quit".to_string(),
            None => " ?:Help q:Quit".to_string(),
        };

        let left = format!(" {} ", mode_str);
        let padding_len = w.saturating_sub(left.len() + right_text.len());
        let padding = " ".repeat(padding_len);

        let line = Line::from(vec![
            Span::styled(left, status),
            Span::styled(padding, status),
            Span::styled(right_text, status),
        ]);

        frame.render_widget(Paragraph::new(line).style(status), area);
    }
}
