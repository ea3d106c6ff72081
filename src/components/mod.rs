pub mod cell;
pub mod detail;
pub mod month_view;
pub mod nav_bar;
pub mod status_bar;
pub mod week_view;
pub mod year_chooser;

pub use detail::DetailPopup;
pub use month_view::MonthView;
pub use nav_bar::NavBar;
pub use status_bar::StatusBar;
pub use week_view::WeekView;
pub use year_chooser::YearChooser;

use ratatui::layout::{Constraint, Layout, Rect};

/// Navigation bar, calendar body, status bar.
pub fn split_screen(area: Rect) -> [Rect; 3] {
    let rows = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .split(area);
    [rows[0], rows[1], rows[2]]
}

/// Centered popup of at most `w` x `h`.
pub fn popup_area(area: Rect, w: u16, h: u16) -> Rect {
    let popup_w = area.width.min(w);
    let popup_h = area.height.min(h);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    Rect::new(x, y, popup_w, popup_h)
}
