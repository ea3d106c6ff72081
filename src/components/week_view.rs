use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::cell::{self, Selection};
use crate::calendar::FeedInfo;
use crate::layout::grid::WEEK_DAYS;
use crate::layout::{CellMetrics, Grid};
use crate::theme;

pub struct WeekView;

impl WeekView {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        grid: &Grid,
        feeds: &[FeedInfo],
        selection: &Selection,
    ) {
        let rows = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).split(area);
        let header_cols = columns(rows[0]);
        let body_cols = columns(rows[1]);
        let t = theme::current();

        for (col, (slot, heading)) in grid.slots.iter().zip(grid.headings()).enumerate() {
            let style = if slot.date == selection.date {
                t.selected
            } else if slot.cell.as_ref().is_some_and(|c| c.is_today) {
                t.today
            } else {
                t.header
            };
            let width = header_cols[col].width as usize;
            let label = Paragraph::new(Line::from(Span::styled(
                format!("{:^width$}", heading, width = width),
                style,
            )));
            frame.render_widget(label, header_cols[col]);

            if let Some(c) = &slot.cell {
                cell::render_cell(frame, body_cols[col], c, feeds, selection);
            }
        }
    }
}

fn columns(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::horizontal([Constraint::Ratio(1, WEEK_DAYS as u32); WEEK_DAYS]).split(area)
}

pub fn cell_metrics(area: Rect, bottom_margin: u16) -> CellMetrics {
    let width = area.width / WEEK_DAYS as u16;
    let height = area.height.saturating_sub(1);
    cell::inner_metrics(width, height, bottom_margin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_cells_use_the_full_height() {
        let m = cell_metrics(Rect::new(0, 0, 70, 30), 1);
        assert_eq!(m.width, 9);
        assert_eq!(m.height, 28);
        assert_eq!(m.bottom_margin, 1);
    }
}
