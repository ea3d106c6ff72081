use chrono::{Datelike, NaiveDate};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::calendar::FeedInfo;
use crate::layout::{CellItem, CellMetrics, DateCell};
use crate::theme::{self, Theme};

/// Cursor over the grid: a date and an item inside its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub date: NaiveDate,
    pub item: Option<usize>,
}

/// Borders drawn around every cell.
pub const CELL_BORDERS: Borders = Borders::TOP.union(Borders::LEFT);

/// Interior of a cell once its top and left borders are drawn.
pub fn inner_metrics(width: u16, height: u16, bottom_margin: u16) -> CellMetrics {
    CellMetrics {
        width: width.saturating_sub(1),
        height: height.saturating_sub(1),
        line_height: 1,
        bottom_margin,
    }
}

pub fn feed_color(feeds: &[FeedInfo], label: usize) -> ratatui::style::Color {
    feeds
        .iter()
        .find(|f| f.label == label)
        .map(|f| f.color)
        .unwrap_or_else(|| theme::feed_color(label))
}

/// Style for an element from its description classes: `today` and `more`
/// take their theme styles, continuation segments are italic.
pub fn class_style(t: &Theme, base: Style, classes: &[&str]) -> Style {
    classes.iter().fold(base, |style, class| match *class {
        "today" => style.patch(t.today),
        "more" => style.patch(t.more),
        "middle" | "last" => style.add_modifier(Modifier::ITALIC),
        _ => style,
    })
}

pub fn render_cell(
    frame: &mut Frame,
    area: Rect,
    cell: &DateCell,
    feeds: &[FeedInfo],
    selection: &Selection,
) {
    let t = theme::current();
    let selected = cell.date() == selection.date;

    let block = Block::default()
        .borders(CELL_BORDERS)
        .border_style(if selected { t.selected } else { t.border });
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let mut lines: Vec<Line> = Vec::new();

    if cell.header_lines > 0 {
        let style = if selected {
            t.selected
        } else {
            class_style(t, t.header, &cell.classes())
        };
        lines.push(Line::from(Span::styled(format!("{:>2}", cell.date().day()), style)));
    }

    for (i, item) in cell.items.iter().enumerate() {
        let focused = selected && selection.item == Some(i);
        match item {
            CellItem::Segment(seg) => {
                let base = t.segment(feed_color(feeds, seg.feed));
                let mut style = class_style(t, base, &seg.classes());
                if focused {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                lines.push(Line::from(Span::styled(
                    format!("{:<width$}", seg.label, width = width),
                    style,
                )));
            }
            CellItem::Overflow(marker) => {
                let mut style = class_style(t, Style::default(), &marker.classes());
                if focused {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                lines.push(Line::from(Span::styled(marker.label(), style)).right_aligned());
            }
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Slot of a month grid that belongs to another month.
pub fn render_empty(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(CELL_BORDERS)
        .border_style(theme::current().border)
        .style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(block, area);
}
