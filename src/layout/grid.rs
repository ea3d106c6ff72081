use std::fmt;

use chrono::{Datelike, Days, NaiveDate};

use super::placement::CellItem;

pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub const DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub const MONTH_ROWS: usize = 6;
pub const WEEK_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewMode {
    Month,
    Week,
}

impl ViewMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "month" => Some(Self::Month),
            "week" => Some(Self::Week),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Month => "Month",
            ViewMode::Week => "Week",
        }
    }

    fn cell_class(&self) -> &'static str {
        match self {
            ViewMode::Month => "monthViewCell",
            ViewMode::Week => "weekViewCell",
        }
    }
}

/// Canonical `YYYYMMDD` identity of a date cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey(NaiveDate);

impl CellKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn content_id(&self) -> String {
        format!("content{}", self)
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.0.year(), self.0.month(), self.0.day())
    }
}

impl From<NaiveDate> for CellKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateCell {
    pub key: CellKey,
    pub is_today: bool,
    /// Lines occupied before any event is placed (the day number in month view).
    pub header_lines: u16,
    pub items: Vec<CellItem>,
    view: ViewMode,
}

impl DateCell {
    fn new(date: NaiveDate, today: NaiveDate, view: ViewMode) -> Self {
        Self {
            key: CellKey::new(date),
            is_today: date == today,
            header_lines: match view {
                ViewMode::Month => 1,
                ViewMode::Week => 0,
            },
            items: Vec::new(),
            view,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.key.date()
    }

    pub fn classes(&self) -> Vec<&'static str> {
        let mut classes = vec![self.view.cell_class()];
        if self.is_today {
            classes.push("today");
        }
        classes
    }

    /// Number of lines currently rendered in this cell.
    pub fn line_count(&self) -> u16 {
        self.header_lines + self.items.len() as u16
    }

    pub fn has_overflow(&self) -> bool {
        self.items.iter().any(CellItem::is_overflow)
    }
}

/// One position of the grid. Month grids have leading and trailing slots
/// that belong to the neighbouring months; those carry no cell.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSlot {
    pub date: NaiveDate,
    pub cell: Option<DateCell>,
}

impl GridSlot {
    pub fn is_empty(&self) -> bool {
        self.cell.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub view: ViewMode,
    pub pivot: NaiveDate,
    pub slots: Vec<GridSlot>,
}

impl Grid {
    pub fn build(view: ViewMode, pivot: NaiveDate, today: NaiveDate) -> Self {
        match view {
            ViewMode::Month => Self::month(pivot, today),
            ViewMode::Week => Self::week(pivot, today),
        }
    }

    /// Always 6 rows of 7 slots, whatever the month length.
    pub fn month(pivot: NaiveDate, today: NaiveDate) -> Self {
        let first = first_of_month(pivot);
        let offset = first.weekday().num_days_from_sunday() as u64;
        let days = days_in_month(first.year(), first.month()) as u64;
        let origin = first - Days::new(offset);

        let slots = (0..(MONTH_ROWS * WEEK_DAYS) as u64)
            .map(|i| {
                let date = origin + Days::new(i);
                let in_month = i >= offset && i < offset + days;
                GridSlot {
                    date,
                    cell: in_month.then(|| DateCell::new(date, today, ViewMode::Month)),
                }
            })
            .collect();

        Self {
            view: ViewMode::Month,
            pivot,
            slots,
        }
    }

    pub fn week(pivot: NaiveDate, today: NaiveDate) -> Self {
        let start = first_date_of_week(pivot);
        let slots = (0..WEEK_DAYS as u64)
            .map(|i| {
                let date = start + Days::new(i);
                GridSlot {
                    date,
                    cell: Some(DateCell::new(date, today, ViewMode::Week)),
                }
            })
            .collect();

        Self {
            view: ViewMode::Week,
            pivot,
            slots,
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = &DateCell> {
        self.slots.iter().filter_map(|s| s.cell.as_ref())
    }

    pub fn cell(&self, key: CellKey) -> Option<&DateCell> {
        self.cells().find(|c| c.key == key)
    }

    pub fn cell_mut(&mut self, key: CellKey) -> Option<&mut DateCell> {
        self.slots
            .iter_mut()
            .filter_map(|s| s.cell.as_mut())
            .find(|c| c.key == key)
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            if let Some(cell) = slot.cell.as_mut() {
                cell.items.clear();
            }
        }
    }

    /// Dates the event source is asked about, inclusive on both ends.
    pub fn visible_range(&self) -> (NaiveDate, NaiveDate) {
        match self.view {
            ViewMode::Month => {
                let first = first_of_month(self.pivot);
                let days = days_in_month(first.year(), first.month()) as u64;
                (first, first + Days::new(days.saturating_sub(1)))
            }
            ViewMode::Week => {
                let start = first_date_of_week(self.pivot);
                (start, start + Days::new(6))
            }
        }
    }

    pub fn headings(&self) -> Vec<String> {
        match self.view {
            ViewMode::Month => DAYS.iter().map(|d| d.to_string()).collect(),
            ViewMode::Week => self.slots.iter().map(|s| week_heading(s.date)).collect(),
        }
    }
}

/// Day count of a month: day 32 of the month rolls over into the next one,
/// and 32 minus the rolled-over day is the length.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_days(Days::new(31)))
        .map(|day32| 32 - day32.day())
        .unwrap_or(0)
}

/// The Sunday on or before `date`.
pub fn first_date_of_week(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.weekday().num_days_from_sunday() as u64)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn month_label(month: u32) -> &'static str {
    MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("Unknown")
}

/// Column heading of a week view: `"Sun 2/5"`.
pub fn week_heading(date: NaiveDate) -> String {
    format!(
        "{} {}/{}",
        DAYS[date.weekday().num_days_from_sunday() as usize],
        date.month(),
        date.day()
    )
}

/// `"Feb 5 - Feb 11 2023"` for the week containing `pivot`.
pub fn week_duration(pivot: NaiveDate) -> String {
    let start = first_date_of_week(pivot);
    let end = start + Days::new(6);
    format!(
        "{} {} - {} {} {}",
        month_label(start.month()),
        start.day(),
        month_label(end.month()),
        end.day(),
        end.year()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn days_in_month_follows_gregorian_rules() {
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 1), 31);
        assert_eq!(days_in_month(2023, 4), 30);
        assert_eq!(days_in_month(2023, 12), 31);
    }

    #[test]
    fn last_representable_month_has_a_range() {
        assert_eq!(days_in_month(NaiveDate::MAX.year(), 12), 0);
        let grid = Grid {
            view: ViewMode::Month,
            pivot: NaiveDate::MAX,
            slots: Vec::new(),
        };
        let first = first_of_month(NaiveDate::MAX);
        assert_eq!(grid.visible_range(), (first, first));
    }

    #[test]
    fn days_in_month_matches_next_month_difference() {
        for year in [1899, 1900, 1999, 2000, 2023, 2024, 2100] {
            for month in 1..=12u32 {
                let first = date(year, month, 1);
                let next = if month == 12 {
                    date(year + 1, 1, 1)
                } else {
                    date(year, month + 1, 1)
                };
                let expected = next.signed_duration_since(first).num_days() as u32;
                assert_eq!(days_in_month(year, month), expected, "{}-{}", year, month);
            }
        }
    }

    #[test]
    fn month_grid_always_has_42_slots() {
        for year in [2015, 2023, 2024] {
            for month in 1..=12u32 {
                let grid = Grid::month(date(year, month, 15), date(2000, 1, 1));
                assert_eq!(grid.slots.len(), 42);

                let offset = date(year, month, 1).weekday().num_days_from_sunday() as usize;
                let days = days_in_month(year, month) as usize;
                for (i, slot) in grid.slots.iter().enumerate() {
                    let in_month = i >= offset && i < offset + days;
                    assert_eq!(slot.cell.is_some(), in_month);
                    if let Some(cell) = &slot.cell {
                        assert_eq!(cell.date().month(), month);
                        assert_eq!(cell.date().day() as usize, i - offset + 1);
                    }
                }
            }
        }
    }

    #[test]
    fn february_2023_starts_on_wednesday() {
        let grid = Grid::month(date(2023, 2, 1), date(2023, 2, 14));

        let leading: Vec<_> = grid.slots[..3].iter().map(|s| s.date).collect();
        assert_eq!(leading, vec![date(2023, 1, 29), date(2023, 1, 30), date(2023, 1, 31)]);
        assert!(grid.slots[..3].iter().all(GridSlot::is_empty));

        assert_eq!(grid.slots[3].cell.as_ref().unwrap().key.to_string(), "20230201");
        assert_eq!(grid.cells().count(), 28);
        assert_eq!(grid.cells().last().unwrap().date(), date(2023, 2, 28));
        assert!(grid.slots[31..].iter().all(GridSlot::is_empty));

        let today = grid.cell(date(2023, 2, 14).into()).unwrap();
        assert_eq!(today.classes(), vec!["monthViewCell", "today"]);
    }

    #[test]
    fn week_grid_is_seven_days_from_sunday() {
        let grid = Grid::week(date(2023, 3, 1), date(2000, 1, 1));
        assert_eq!(grid.slots.len(), 7);
        assert_eq!(grid.slots[0].date, date(2023, 2, 26));
        for pair in grid.slots.windows(2) {
            assert_eq!(pair[1].date, pair[0].date.succ_opt().unwrap());
        }
        assert_eq!(grid.headings()[0], "Sun 2/26");
        assert_eq!(grid.headings()[3], "Wed 3/1");
    }

    #[test]
    fn sunday_pivot_is_its_own_week_start() {
        assert_eq!(first_date_of_week(date(2023, 2, 5)), date(2023, 2, 5));
        assert_eq!(first_date_of_week(date(2023, 2, 11)), date(2023, 2, 5));
    }

    #[test]
    fn cell_keys_are_zero_padded() {
        let key = CellKey::new(date(2023, 2, 3));
        assert_eq!(key.to_string(), "20230203");
        assert_eq!(key.content_id(), "content20230203");
    }

    #[test]
    fn visible_range_covers_month_or_week() {
        let month = Grid::month(date(2024, 2, 20), date(2024, 2, 20));
        assert_eq!(month.visible_range(), (date(2024, 2, 1), date(2024, 2, 29)));

        let week = Grid::week(date(2023, 12, 28), date(2023, 12, 28));
        assert_eq!(week.visible_range(), (date(2023, 12, 24), date(2023, 12, 30)));
        assert_eq!(week_duration(date(2023, 12, 28)), "Dec 24 - Dec 30 2023");
        assert_eq!(week_duration(date(2023, 12, 31)), "Dec 31 - Jan 6 2024");
    }
}
