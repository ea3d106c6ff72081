use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate};
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::calendar::{CalendarEvent, EventSource, FeedInfo};
use crate::components::{self, cell::Selection, month_view, week_view};
use crate::config::Config;
use crate::engine::{Activation, Calendar, FetchOutcome, FetchRequest, NavigationError, Trigger};
use crate::layout::{CellItem, CellKey, TerminalMeasure, ViewMode};

pub struct App {
    pub running: bool,
    pub calendar: Calendar,
    pub feeds: Vec<FeedInfo>,
    pub selected_date: NaiveDate,
    pub selected_item: Option<usize>,
    /// Event shown by the default display, with the feed it came from.
    pub detail: Option<(Arc<CalendarEvent>, usize)>,
    /// Index into the year options while the chooser is open.
    pub year_chooser: Option<usize>,
    pub show_help: bool,
    pub status_message: Option<String>,
    bottom_margin: u16,
    max_results: usize,
    source: Arc<dyn EventSource>,
    fetch_tx: UnboundedSender<FetchOutcome>,
}

impl App {
    pub fn new(
        config: &Config,
        source: Arc<dyn EventSource>,
        fetch_tx: UnboundedSender<FetchOutcome>,
        today: NaiveDate,
    ) -> Self {
        let calendar = Calendar::new(config.calendar_options(), today, config.feeds.len());
        Self {
            running: true,
            calendar,
            feeds: config.feeds.clone(),
            selected_date: today,
            selected_item: None,
            detail: None,
            year_chooser: None,
            show_help: false,
            status_message: config
                .feeds
                .is_empty()
                .then(|| "no feeds configured".to_string()),
            bottom_margin: config.bottom_margin,
            max_results: config.max_results,
            source,
            fetch_tx,
        }
    }

    /// First rebuild and fetch.
    pub fn start(&mut self) {
        let request = self.calendar.refresh();
        self.dispatch(request);
    }

    /// One fetch task per feed, each reporting back on the channel.
    pub fn dispatch(&self, request: FetchRequest) {
        for feed in &self.feeds {
            let mut query = request.query(&feed.id);
            query.max_results = self.max_results;
            let source = Arc::clone(&self.source);
            let tx = self.fetch_tx.clone();
            let label = feed.label;
            debug!(
                generation = request.generation,
                feed = %feed.id,
                class = %feed.css_id(),
                "fetch dispatched"
            );
            tokio::spawn(async move {
                let result = source.fetch(query).await;
                let _ = tx.send(FetchOutcome {
                    generation: request.generation,
                    feed: label,
                    result,
                });
            });
        }
    }

    pub fn apply_fetch(&mut self, outcome: FetchOutcome) -> bool {
        let applied = self.calendar.apply_fetch(outcome, &TerminalMeasure);
        if applied {
            self.clamp_item();
        }
        applied
    }

    /// Recompute cell sizes for the terminal area. Returns true when the
    /// visible grid was rebuilt.
    pub fn resize(&mut self, area: Rect) -> bool {
        let [_, body, _] = components::split_screen(area);
        let month = month_view::cell_metrics(body, self.bottom_margin);
        let week = week_view::cell_metrics(body, self.bottom_margin);
        let mut rebuilt = false;
        for (view, metrics) in [(ViewMode::Month, month), (ViewMode::Week, week)] {
            if let Some(request) = self.calendar.set_metrics(view, metrics) {
                debug!(?view, width = metrics.width, height = metrics.height, "cell size changed");
                self.dispatch(request);
                rebuilt = true;
            }
        }
        rebuilt
    }

    pub fn selection(&self) -> Selection {
        Selection {
            date: self.selected_date,
            item: self.selected_item,
        }
    }

    pub fn feed_color(&self, label: usize) -> ratatui::style::Color {
        components::cell::feed_color(&self.feeds, label)
    }

    // ── navigation ──

    fn navigated(&mut self, request: FetchRequest) {
        let pivot = self.calendar.pivot();
        if self.calendar.grid().cell(CellKey::new(self.selected_date)).is_none() {
            self.selected_date = pivot;
        }
        self.selected_item = None;
        self.dispatch(request);
    }

    pub fn switch_view(&mut self, view: ViewMode) {
        info!(?view, "switching view");
        let visible = self.calendar.grid().cell(CellKey::new(self.selected_date)).is_some();
        let request = if view == ViewMode::Week && visible {
            // Open the week the cursor is on rather than the pivot's.
            self.calendar.open_week_of(self.selected_date)
        } else {
            self.calendar.switch_view(view)
        };
        self.navigated(request);
    }

    pub fn go_to_today(&mut self, today: NaiveDate) {
        self.selected_date = today;
        let request = self.calendar.go_to_today(today);
        self.navigated(request);
    }

    pub fn next(&mut self) {
        let request = self.calendar.next();
        self.selected_date = self.calendar.pivot();
        self.navigated(request);
    }

    pub fn prev(&mut self) {
        let request = self.calendar.prev();
        self.selected_date = self.calendar.pivot();
        self.navigated(request);
    }

    /// Move the selected date; leaving the grid pages to the next or previous view.
    pub fn move_selection(&mut self, days: i64) {
        let moved = if days >= 0 {
            self.selected_date.checked_add_days(Days::new(days as u64))
        } else {
            self.selected_date.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        let Some(date) = moved else {
            return;
        };
        self.selected_date = date;
        self.selected_item = None;

        if self.calendar.grid().cell(CellKey::new(date)).is_none() {
            let (start, _) = self.calendar.grid().visible_range();
            let request = if date < start {
                self.calendar.prev()
            } else {
                self.calendar.next()
            };
            // The new grid shows `date` unless paging skipped past it.
            if self.calendar.grid().cell(CellKey::new(date)).is_none() {
                self.selected_date = self.calendar.pivot();
            }
            self.dispatch(request);
        }
    }

    /// Step through the items of the selected cell.
    pub fn cycle_item(&mut self, forward: bool) {
        let count = self.selected_items().len();
        if count == 0 {
            self.selected_item = None;
            return;
        }
        self.selected_item = Some(match (self.selected_item, forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i + count - 1) % count,
        });

        if self.calendar.trigger() == Trigger::Hover && self.selected_is_segment() {
            self.activate_selected();
        }
    }

    /// Enter on the selected item. Segments react to it only with the click
    /// trigger; overflow markers always do.
    pub fn click_selected(&mut self) {
        if self.calendar.trigger() == Trigger::Click || !self.selected_is_segment() {
            self.activate_selected();
        }
    }

    fn activate_selected(&mut self) {
        let Some(index) = self.selected_item else {
            return;
        };
        let feed = match self.selected_items().get(index) {
            Some(CellItem::Segment(seg)) => seg.feed,
            _ => 0,
        };
        match self.calendar.activate(CellKey::new(self.selected_date), index) {
            Some(Activation::ShowDetail(event)) => self.detail = Some((event, feed)),
            Some(Activation::Navigated(request)) => {
                self.selected_date = self.calendar.pivot();
                self.selected_item = None;
                self.dispatch(request);
            }
            Some(Activation::Handled) | None => {}
        }
    }

    // ── year chooser ──

    pub fn open_year_chooser(&mut self) {
        if self.calendar.view_mode() != ViewMode::Month {
            self.status_message = Some(NavigationError::YearRequiresMonthView.to_string());
            return;
        }
        let years = self.calendar.year_options();
        let current = self.calendar.pivot().year();
        let index = years.iter().position(|y| *y == current).unwrap_or(0);
        self.year_chooser = Some(index);
    }

    pub fn move_year_chooser(&mut self, delta: i32) {
        let count = self.calendar.year_options().len() as i32;
        if let Some(index) = self.year_chooser.as_mut() {
            if count > 0 {
                *index = (*index as i32 + delta).clamp(0, count - 1) as usize;
            }
        }
    }

    pub fn confirm_year(&mut self) {
        let Some(index) = self.year_chooser.take() else {
            return;
        };
        let Some(year) = self.calendar.year_options().get(index).copied() else {
            return;
        };
        match self.calendar.select_year(year) {
            Ok(request) => {
                self.selected_date = self.calendar.pivot();
                self.navigated(request);
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    /// Status line text: app messages first, then the feed status.
    pub fn status_text(&self) -> Option<&str> {
        self.status_message
            .as_deref()
            .or_else(|| Some(self.calendar.status_text()).filter(|s| !s.is_empty()))
    }

    fn selected_items(&self) -> &[CellItem] {
        self.calendar
            .grid()
            .cell(CellKey::new(self.selected_date))
            .map(|c| c.items.as_slice())
            .unwrap_or(&[])
    }

    fn selected_is_segment(&self) -> bool {
        self.selected_item
            .and_then(|i| self.selected_items().get(i))
            .is_some_and(|item| !item.is_overflow())
    }

    fn clamp_item(&mut self) {
        let count = self.selected_items().len();
        if let Some(i) = self.selected_item {
            if i >= count {
                self.selected_item = count.checked_sub(1);
            }
        }
    }
}
