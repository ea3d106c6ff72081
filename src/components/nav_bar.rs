use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::layout::ViewMode;
use crate::theme;

pub const TODAY_LABEL: &str = "Today";
pub const PREV_LABEL: &str = "<<";
pub const NEXT_LABEL: &str = ">>";

/// Today / prev / caption / next on the left, the view switch on the right.
pub struct NavBar;

impl NavBar {
    pub fn render(frame: &mut Frame, area: Rect, view: ViewMode, caption: &str) {
        let t = theme::current();
        let halves = Layout::horizontal([Constraint::Min(0), Constraint::Length(16)]).split(area);

        let nav = Line::from(vec![
            Span::styled(format!(" [{}] ", TODAY_LABEL), t.header),
            Span::styled(format!("{} ", PREV_LABEL), t.dim),
            Span::styled(caption.to_string(), t.header.add_modifier(Modifier::BOLD)),
            Span::styled(format!(" {}", NEXT_LABEL), t.dim),
        ]);
        frame.render_widget(Paragraph::new(nav), halves[0]);

        let button = |mode: ViewMode| {
            let style = if mode == view { t.selected } else { t.dim };
            Span::styled(format!(" {} ", mode.label()), style)
        };
        let views = Line::from(vec![
            button(ViewMode::Week),
            Span::raw(" "),
            button(ViewMode::Month),
        ])
        .right_aligned();
        frame.render_widget(Paragraph::new(views), halves[1]);
    }
}
