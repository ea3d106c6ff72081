use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
    Frame,
};

use crate::theme;

pub struct YearChooser;

impl YearChooser {
    pub fn render(frame: &mut Frame, area: Rect, years: &[i32], selected: usize, current: i32) {
        let t = theme::current();
        let popup_area = super::popup_area(area, 14, 12);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(" Year ")
            .title_style(t.header)
            .borders(Borders::ALL)
            .border_style(t.border);

        let items: Vec<ListItem> = years
            .iter()
            .map(|y| {
                let style = if *y == current { t.today } else { t.header };
                ListItem::new(Line::from(Span::styled(format!(" {} ", y), style)))
            })
            .collect();

        let list = List::new(items).block(block).highlight_style(t.selected);
        let mut state = ListState::default().with_selected(Some(selected));
        frame.render_stateful_widget(list, popup_area, &mut state);
    }
}
