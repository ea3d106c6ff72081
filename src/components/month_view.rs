use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::cell::{self, Selection};
use crate::calendar::FeedInfo;
use crate::layout::grid::{MONTH_ROWS, WEEK_DAYS};
use crate::layout::{CellMetrics, Grid};
use crate::theme;

pub struct MonthView;

impl MonthView {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        grid: &Grid,
        feeds: &[FeedInfo],
        selection: &Selection,
    ) {
        let rows = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).split(area);
        let header_cols = columns(rows[0]);

        for (col, heading) in grid.headings().iter().enumerate() {
            let label = Paragraph::new(Line::from(Span::styled(
                format!(" {}", heading),
                theme::current().header,
            )));
            frame.render_widget(label, header_cols[col]);
        }

        let week_rows = Layout::vertical([Constraint::Ratio(1, MONTH_ROWS as u32); MONTH_ROWS])
            .split(rows[1]);

        for (row, row_area) in week_rows.iter().enumerate() {
            let cols = columns(*row_area);
            for (col, cell_area) in cols.iter().enumerate() {
                let Some(slot) = grid.slots.get(row * WEEK_DAYS + col) else {
                    continue;
                };
                match &slot.cell {
                    Some(c) => cell::render_cell(frame, *cell_area, c, feeds, selection),
                    None => cell::render_empty(frame, *cell_area),
                }
            }
        }
    }
}

fn columns(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::horizontal([Constraint::Ratio(1, WEEK_DAYS as u32); WEEK_DAYS]).split(area)
}

/// Smallest cell interior the month grid produces inside `area`.
pub fn cell_metrics(area: Rect, bottom_margin: u16) -> CellMetrics {
    let width = area.width / WEEK_DAYS as u16;
    let height = area.height.saturating_sub(1) / MONTH_ROWS as u16;
    cell::inner_metrics(width, height, bottom_margin)
}
