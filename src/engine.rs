use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, Days, Months, NaiveDate};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::calendar::{CalendarEvent, FeedError, FeedQuery};
use crate::layout::fit::{CellMetrics, TextMeasure};
use crate::layout::grid::{self, CellKey, Grid, ViewMode};
use crate::layout::placement::{self, CellItem};

pub const LOADING_LABEL: &str = " loading... ";

/// Most years the year chooser offers.
pub const MAX_YEAR_COUNT: u32 = 1000;

/// What makes an event segment react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trigger {
    #[default]
    Click,
    Hover,
}

impl Trigger {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "click" => Some(Self::Click),
            "hover" | "mouseover" => Some(Self::Hover),
            _ => None,
        }
    }
}

pub type EventCallback = Box<dyn FnMut(&CalendarEvent) + Send>;

pub struct CalendarOptions {
    pub default_view: ViewMode,
    pub trigger: Trigger,
    /// First year offered by the year chooser.
    pub year_start: i32,
    pub year_count: u32,
    pub month_metrics: CellMetrics,
    pub week_metrics: CellMetrics,
    /// Replaces the default detail display when set.
    pub on_event: Option<EventCallback>,
}

impl Default for CalendarOptions {
    fn default() -> Self {
        Self {
            default_view: ViewMode::Month,
            trigger: Trigger::Click,
            year_start: 2000,
            year_count: 20,
            month_metrics: CellMetrics::default(),
            week_metrics: CellMetrics {
                height: 20,
                ..CellMetrics::default()
            },
            on_event: None,
        }
    }
}

impl fmt::Debug for CalendarOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarOptions")
            .field("default_view", &self.default_view)
            .field("trigger", &self.trigger)
            .field("year_start", &self.year_start)
            .field("year_count", &self.year_count)
            .field("month_metrics", &self.month_metrics)
            .field("week_metrics", &self.week_metrics)
            .field("on_event", &self.on_event.is_some())
            .finish()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("a year can only be chosen in month view")]
    YearRequiresMonthView,
    #[error("year {0} is not offered by the year chooser")]
    YearOutOfRange(i32),
}

/// Dates to fetch after a rebuild, tagged with the rebuild that asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub start: NaiveDate,
    /// Inclusive.
    pub end: NaiveDate,
}

impl FetchRequest {
    pub fn query(&self, feed_id: &str) -> FeedQuery {
        let end = self.end.checked_add_days(Days::new(1)).unwrap_or(self.end);
        FeedQuery::new(feed_id, self.start, end)
    }
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub generation: u64,
    pub feed: usize,
    pub result: Result<Vec<CalendarEvent>, FeedError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Idle,
    Loading,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    /// The configured event callback ran.
    Handled,
    /// No callback configured; the caller shows the event itself.
    ShowDetail(Arc<CalendarEvent>),
    /// An overflow marker switched to week view.
    Navigated(FetchRequest),
}

pub struct Calendar {
    options: CalendarOptions,
    today: NaiveDate,
    pivot: NaiveDate,
    view: ViewMode,
    generation: u64,
    feed_count: usize,
    pending: usize,
    status: FeedStatus,
    grid: Grid,
}

impl Calendar {
    pub fn new(options: CalendarOptions, today: NaiveDate, feed_count: usize) -> Self {
        let view = options.default_view;
        Self {
            grid: Grid::build(view, today, today),
            options,
            today,
            pivot: today,
            view,
            generation: 0,
            feed_count,
            pending: 0,
            status: FeedStatus::Idle,
        }
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view
    }

    pub fn pivot(&self) -> NaiveDate {
        self.pivot
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn trigger(&self) -> Trigger {
        self.options.trigger
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn status_text(&self) -> &str {
        match &self.status {
            FeedStatus::Idle => "",
            FeedStatus::Loading => LOADING_LABEL,
            FeedStatus::Failed(msg) => msg,
        }
    }

    pub fn metrics(&self) -> CellMetrics {
        match self.view {
            ViewMode::Month => self.options.month_metrics,
            ViewMode::Week => self.options.week_metrics,
        }
    }

    /// `year_count` years from `year_start`, stopping at the last year chrono
    /// can represent.
    pub fn year_options(&self) -> Vec<i32> {
        (0..self.options.year_count.min(MAX_YEAR_COUNT))
            .map_while(|i| {
                let i = i32::try_from(i).ok()?;
                self.options.year_start.checked_add(i)
            })
            .take_while(|y| NaiveDate::from_ymd_opt(*y, 1, 1).is_some())
            .collect()
    }

    /// Navigation caption: `"Feb"` plus year in month view, the week span otherwise.
    pub fn nav_label(&self) -> String {
        match self.view {
            ViewMode::Month => format!(
                "{} {}",
                grid::month_label(self.pivot.month()),
                self.pivot.year()
            ),
            ViewMode::Week => grid::week_duration(self.pivot),
        }
    }

    /// Build the grid for the current state.
    pub fn refresh(&mut self) -> FetchRequest {
        self.rebuild()
    }

    pub fn switch_view(&mut self, view: ViewMode) -> FetchRequest {
        self.view = view;
        self.rebuild()
    }

    pub fn go_to_today(&mut self, today: NaiveDate) -> FetchRequest {
        self.today = today;
        self.pivot = today;
        self.rebuild()
    }

    pub fn next(&mut self) -> FetchRequest {
        self.pivot = match self.view {
            ViewMode::Month => grid::first_of_month(self.pivot)
                .checked_add_months(Months::new(1))
                .unwrap_or(self.pivot),
            ViewMode::Week => self
                .pivot
                .checked_add_days(Days::new(7))
                .unwrap_or(self.pivot),
        };
        self.rebuild()
    }

    pub fn prev(&mut self) -> FetchRequest {
        self.pivot = match self.view {
            ViewMode::Month => grid::first_of_month(self.pivot)
                .checked_sub_months(Months::new(1))
                .unwrap_or(self.pivot),
            ViewMode::Week => self
                .pivot
                .checked_sub_days(Days::new(7))
                .unwrap_or(self.pivot),
        };
        self.rebuild()
    }

    /// Replace the pivot's year. A Feb 29 pivot in a common year rolls over
    /// to Mar 1.
    pub fn select_year(&mut self, year: i32) -> Result<FetchRequest, NavigationError> {
        if self.view != ViewMode::Month {
            return Err(NavigationError::YearRequiresMonthView);
        }
        if !self.year_options().contains(&year) {
            return Err(NavigationError::YearOutOfRange(year));
        }

        self.pivot = self.pivot.with_year(year).unwrap_or_else(|| {
            NaiveDate::from_ymd_opt(year, 3, 1).unwrap_or(self.pivot)
        });
        Ok(self.rebuild())
    }

    /// Week view around `date`, as opened from an overflow marker.
    pub fn open_week_of(&mut self, date: NaiveDate) -> FetchRequest {
        self.pivot = date;
        self.view = ViewMode::Week;
        self.rebuild()
    }

    /// Record new cell dimensions. Rebuilds when the active view is affected.
    pub fn set_metrics(&mut self, view: ViewMode, metrics: CellMetrics) -> Option<FetchRequest> {
        let slot = match view {
            ViewMode::Month => &mut self.options.month_metrics,
            ViewMode::Week => &mut self.options.week_metrics,
        };
        if *slot == metrics {
            return None;
        }
        *slot = metrics;
        (view == self.view).then(|| self.rebuild())
    }

    #[instrument(skip(self), fields(view = ?self.view, pivot = %self.pivot))]
    fn rebuild(&mut self) -> FetchRequest {
        self.generation += 1;
        self.grid = Grid::build(self.view, self.pivot, self.today);
        self.pending = self.feed_count;
        self.status = if self.feed_count > 0 {
            FeedStatus::Loading
        } else {
            FeedStatus::Idle
        };

        let (start, end) = self.grid.visible_range();
        info!(generation = self.generation, %start, %end, "grid rebuilt");
        FetchRequest {
            generation: self.generation,
            start,
            end,
        }
    }

    /// Place the events of a finished fetch. Outcomes from an earlier
    /// rebuild are discarded and `false` is returned.
    pub fn apply_fetch(&mut self, outcome: FetchOutcome, measure: &dyn TextMeasure) -> bool {
        if outcome.generation != self.generation {
            debug!(
                stale = outcome.generation,
                current = self.generation,
                feed = outcome.feed,
                "discarding stale fetch"
            );
            return false;
        }

        self.pending = self.pending.saturating_sub(1);
        match outcome.result {
            Ok(events) => {
                let metrics = self.metrics();
                let placed = placement::place_events(
                    &mut self.grid,
                    &events,
                    outcome.feed,
                    metrics,
                    measure,
                );
                debug!(feed = outcome.feed, events = events.len(), placed, "events placed");
                if self.pending == 0 && self.status == FeedStatus::Loading {
                    self.status = FeedStatus::Idle;
                }
            }
            Err(e) => {
                warn!(feed = outcome.feed, error = %e, "feed fetch failed");
                self.status = FeedStatus::Failed(e.status_text());
            }
        }
        true
    }

    /// Route an interaction with the item at `index` of the cell `key`.
    pub fn activate(&mut self, key: CellKey, index: usize) -> Option<Activation> {
        let item = self.grid.cell(key)?.items.get(index)?.clone();
        match item {
            CellItem::Segment(segment) => match self.options.on_event.as_mut() {
                Some(callback) => {
                    callback(&segment.event);
                    Some(Activation::Handled)
                }
                None => Some(Activation::ShowDetail(segment.event)),
            },
            CellItem::Overflow(marker) => {
                Some(Activation::Navigated(self.open_week_of(marker.week_of)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::calendar::EventStatus;
    use crate::layout::fit::TerminalMeasure;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(title: &str, day: NaiveDate, hour: u32) -> CalendarEvent {
        CalendarEvent {
            id: title.to_lowercase(),
            title: title.to_string(),
            start: day.and_hms_opt(hour, 0, 0).unwrap(),
            end: day.and_hms_opt(hour + 1, 0, 0).unwrap(),
            is_all_day: false,
            status: EventStatus::Confirmed,
            location: None,
            notes: None,
        }
    }

    fn calendar(today: NaiveDate) -> Calendar {
        Calendar::new(CalendarOptions::default(), today, 1)
    }

    fn ok(generation: u64, events: Vec<CalendarEvent>) -> FetchOutcome {
        FetchOutcome {
            generation,
            feed: 0,
            result: Ok(events),
        }
    }

    #[test]
    fn month_navigation_moves_to_first_of_month() {
        let mut cal = calendar(date(2023, 1, 31));
        let req = cal.next();
        assert_eq!(cal.pivot(), date(2023, 2, 1));
        assert_eq!((req.start, req.end), (date(2023, 2, 1), date(2023, 2, 28)));

        cal.prev();
        cal.prev();
        assert_eq!(cal.pivot(), date(2022, 12, 1));
        assert_eq!(cal.nav_label(), "Dec 2022");
    }

    #[test]
    fn week_navigation_moves_seven_days() {
        let mut cal = calendar(date(2023, 2, 8));
        let req = cal.switch_view(ViewMode::Week);
        assert_eq!((req.start, req.end), (date(2023, 2, 5), date(2023, 2, 11)));
        assert_eq!(cal.nav_label(), "Feb 5 - Feb 11 2023");

        let req = cal.next();
        assert_eq!(req.start, date(2023, 2, 12));
        cal.prev();
        cal.prev();
        assert_eq!(cal.pivot(), date(2023, 2, 1));
        assert_eq!(cal.view_mode(), ViewMode::Week);
    }

    #[test]
    fn today_keeps_the_view() {
        let mut cal = calendar(date(2023, 2, 8));
        cal.switch_view(ViewMode::Week);
        cal.next();
        cal.go_to_today(date(2023, 3, 2));
        assert_eq!(cal.pivot(), date(2023, 3, 2));
        assert_eq!(cal.view_mode(), ViewMode::Week);
        assert!(cal.grid().cell(date(2023, 3, 2).into()).unwrap().is_today);
    }

    #[test]
    fn year_selection_only_in_month_view() {
        let mut cal = calendar(date(2012, 2, 29));
        assert_eq!(cal.year_options().first(), Some(&2000));
        assert_eq!(cal.year_options().len(), 20);

        cal.select_year(2013).unwrap();
        assert_eq!(cal.pivot(), date(2013, 3, 1));
        assert_eq!(cal.select_year(1999), Err(NavigationError::YearOutOfRange(1999)));

        cal.switch_view(ViewMode::Week);
        assert_eq!(cal.select_year(2010), Err(NavigationError::YearRequiresMonthView));
    }

    #[test]
    fn year_options_stay_in_range() {
        let options = CalendarOptions {
            year_count: u32::MAX,
            ..CalendarOptions::default()
        };
        let cal = Calendar::new(options, date(2023, 2, 8), 1);
        assert_eq!(cal.year_options().len(), MAX_YEAR_COUNT as usize);
        assert_eq!(cal.year_options().first(), Some(&2000));

        let options = CalendarOptions {
            year_start: i32::MAX - 1,
            year_count: 5,
            ..CalendarOptions::default()
        };
        let cal = Calendar::new(options, date(2023, 2, 8), 1);
        assert!(cal.year_options().is_empty());
    }

    #[test]
    fn every_transition_bumps_the_generation() {
        let mut cal = calendar(date(2023, 2, 8));
        let a = cal.refresh();
        let b = cal.next();
        let c = cal.switch_view(ViewMode::Week);
        assert!(a.generation < b.generation && b.generation < c.generation);
        assert_eq!(cal.generation(), c.generation);
    }

    #[test]
    fn stale_fetch_is_discarded() {
        let mut cal = calendar(date(2023, 2, 8));
        let old = cal.refresh();
        let current = cal.next();

        let feb = vec![event("Old", date(2023, 2, 10), 9)];
        assert!(!cal.apply_fetch(ok(old.generation, feb), &TerminalMeasure));
        assert!(cal.grid().cells().all(|c| c.items.is_empty()));
        assert_eq!(cal.status(), &FeedStatus::Loading);

        let mar = vec![event("New", date(2023, 3, 10), 9)];
        assert!(cal.apply_fetch(ok(current.generation, mar), &TerminalMeasure));
        let cell = cal.grid().cell(date(2023, 3, 10).into()).unwrap();
        assert_eq!(cell.items.len(), 1);
        assert_eq!(cal.status(), &FeedStatus::Idle);
        assert_eq!(cal.status_text(), "");
    }

    #[test]
    fn loading_until_every_feed_reports() {
        let mut cal = Calendar::new(CalendarOptions::default(), date(2023, 2, 8), 2);
        let req = cal.refresh();
        assert_eq!(cal.status_text(), LOADING_LABEL);

        cal.apply_fetch(ok(req.generation, vec![]), &TerminalMeasure);
        assert_eq!(cal.status(), &FeedStatus::Loading);
        cal.apply_fetch(
            FetchOutcome {
                generation: req.generation,
                feed: 1,
                result: Err(FeedError::NotFound("holidays".to_string())),
            },
            &TerminalMeasure,
        );
        assert_eq!(cal.status_text(), "feed 'holidays' not found");
    }

    #[test]
    fn rebuild_with_same_events_is_identical() {
        let mut cal = calendar(date(2023, 2, 8));
        let events = vec![event("A", date(2023, 2, 10), 9), event("B", date(2023, 2, 10), 13)];

        let req = cal.refresh();
        cal.apply_fetch(ok(req.generation, events.clone()), &TerminalMeasure);
        let first = cal.grid().clone();

        let req = cal.refresh();
        cal.apply_fetch(ok(req.generation, events), &TerminalMeasure);
        assert_eq!(cal.grid(), &first);
    }

    #[test]
    fn metrics_change_rebuilds_only_active_view() {
        let mut cal = calendar(date(2023, 2, 8));
        let week = CellMetrics {
            width: 30,
            ..CellMetrics::default()
        };
        assert!(cal.set_metrics(ViewMode::Week, week).is_none());
        assert!(cal.set_metrics(ViewMode::Week, week).is_none());

        let month = CellMetrics {
            width: 9,
            ..CellMetrics::default()
        };
        assert!(cal.set_metrics(ViewMode::Month, month).is_some());
        assert!(cal.set_metrics(ViewMode::Month, month).is_none());
        assert_eq!(cal.metrics(), month);
    }

    #[test]
    fn activation_defaults_to_detail() {
        let mut cal = calendar(date(2023, 2, 8));
        let req = cal.refresh();
        let ev = event("Review", date(2023, 2, 10), 9);
        cal.apply_fetch(ok(req.generation, vec![ev.clone()]), &TerminalMeasure);

        let key = CellKey::new(date(2023, 2, 10));
        assert_eq!(cal.activate(key, 0), Some(Activation::ShowDetail(Arc::new(ev))));
        assert_eq!(cal.activate(key, 1), None);
        assert_eq!(cal.activate(CellKey::new(date(2023, 1, 30)), 0), None);
    }

    #[test]
    fn activation_runs_configured_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let options = CalendarOptions {
            on_event: Some(Box::new(move |ev: &CalendarEvent| {
                sink.lock().unwrap().push(ev.title.clone());
            })),
            ..CalendarOptions::default()
        };
        let mut cal = Calendar::new(options, date(2023, 2, 8), 1);
        let req = cal.refresh();
        cal.apply_fetch(
            ok(req.generation, vec![event("Retro", date(2023, 2, 9), 15)]),
            &TerminalMeasure,
        );

        let result = cal.activate(CellKey::new(date(2023, 2, 9)), 0);
        assert_eq!(result, Some(Activation::Handled));
        assert_eq!(*seen.lock().unwrap(), vec!["Retro".to_string()]);
    }

    #[test]
    fn overflow_marker_opens_week_view() {
        let options = CalendarOptions {
            month_metrics: CellMetrics {
                width: 20,
                height: 2,
                line_height: 1,
                bottom_margin: 0,
            },
            ..CalendarOptions::default()
        };
        let mut cal = Calendar::new(options, date(2023, 2, 8), 1);
        let req = cal.refresh();
        let day = date(2023, 2, 16);
        let events = vec![event("A", day, 9), event("B", day, 10)];
        cal.apply_fetch(ok(req.generation, events), &TerminalMeasure);

        let key = CellKey::new(day);
        let cell = cal.grid().cell(key).unwrap();
        assert_eq!(cell.items.len(), 1);
        assert!(cell.items[0].is_overflow());

        let Some(Activation::Navigated(next)) = cal.activate(key, 0) else {
            panic!("expected navigation");
        };
        assert_eq!(cal.view_mode(), ViewMode::Week);
        assert_eq!(cal.pivot(), day);
        assert_eq!((next.start, next.end), (date(2023, 2, 12), date(2023, 2, 18)));
    }

    #[test]
    fn fetch_query_end_is_exclusive() {
        let mut cal = calendar(date(2023, 2, 8));
        let q = cal.refresh().query("work");
        assert_eq!(q.start, date(2023, 2, 1));
        assert_eq!(q.end, date(2023, 3, 1));
        assert_eq!(q.max_results, 500);
    }
}
