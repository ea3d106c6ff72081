use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::trace;

use super::fit::{fit_text, CellMetrics, TextMeasure};
use super::grid::{CellKey, Grid};
use crate::calendar::CalendarEvent;

const MS_PER_DAY: i64 = 86_400_000;

pub const MORE_LABEL: &str = "more";

/// Where a segment sits within the days an event spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanPosition {
    Single,
    First,
    Middle,
    Last,
}

impl SpanPosition {
    pub fn for_day(day: u32, span: u32) -> Self {
        if span <= 1 {
            SpanPosition::Single
        } else if day == 0 {
            SpanPosition::First
        } else if day + 1 == span {
            SpanPosition::Last
        } else {
            SpanPosition::Middle
        }
    }

    pub fn class(&self) -> Option<&'static str> {
        match self {
            SpanPosition::Single => None,
            SpanPosition::First => Some("first"),
            SpanPosition::Middle => Some("middle"),
            SpanPosition::Last => Some("last"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventSegment {
    pub label: String,
    pub position: SpanPosition,
    /// Index of the feed the event came from.
    pub feed: usize,
    pub event: Arc<CalendarEvent>,
}

impl EventSegment {
    pub fn classes(&self) -> Vec<&'static str> {
        let mut classes = vec!["eventItem"];
        classes.extend(self.position.class());
        classes
    }
}

/// Stands in for everything a full cell could not show. Activating it opens
/// the week containing `week_of`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverflowMarker {
    pub week_of: NaiveDate,
}

impl OverflowMarker {
    pub fn label(&self) -> &'static str {
        MORE_LABEL
    }

    pub fn classes(&self) -> Vec<&'static str> {
        vec!["eventItem", "more"]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellItem {
    Segment(EventSegment),
    Overflow(OverflowMarker),
}

impl CellItem {
    pub fn is_overflow(&self) -> bool {
        matches!(self, CellItem::Overflow(_))
    }

    pub fn label(&self) -> &str {
        match self {
            CellItem::Segment(s) => &s.label,
            CellItem::Overflow(m) => m.label(),
        }
    }
}

/// Whole days between start and end, floored.
pub fn span_days(event: &CalendarEvent) -> u32 {
    let ms = (event.end - event.start).num_milliseconds();
    ms.div_euclid(MS_PER_DAY).max(0) as u32
}

/// Number of cells an event occupies. Events shorter than a day still get one.
pub fn segment_count(event: &CalendarEvent) -> u32 {
    span_days(event).max(1)
}

/// Outcome of placing a single segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placed {
    Appended,
    Overflowed,
    /// No cell for that date in the current grid.
    Dropped,
}

/// Place every non-cancelled event of one feed onto `grid`.
pub fn place_events(
    grid: &mut Grid,
    events: &[CalendarEvent],
    feed: usize,
    metrics: CellMetrics,
    measure: &dyn TextMeasure,
) -> usize {
    let mut appended = 0;
    for event in events.iter().filter(|e| !e.is_cancelled()) {
        let event = Arc::new(event.clone());
        appended += place_event(grid, &event, feed, metrics, measure)
            .into_iter()
            .filter(|p| *p == Placed::Appended)
            .count();
    }
    appended
}

/// Place one event, emitting one segment per spanned day.
pub fn place_event(
    grid: &mut Grid,
    event: &Arc<CalendarEvent>,
    feed: usize,
    metrics: CellMetrics,
    measure: &dyn TextMeasure,
) -> Vec<Placed> {
    if event.is_cancelled() {
        return Vec::new();
    }

    let span = span_days(event);
    let count = segment_count(event);
    let label = fit_text(&event.cell_label(), metrics.width, measure);
    let start = event.start.date();

    (0..count)
        .map(|day| {
            let Some(date) = start.checked_add_days(Days::new(day as u64)) else {
                return Placed::Dropped;
            };
            let segment = EventSegment {
                label: label.clone(),
                position: SpanPosition::for_day(day, span),
                feed,
                event: Arc::clone(event),
            };
            append_segment(grid, CellKey::new(date), segment, metrics)
        })
        .collect()
}

/// Append a segment unless the cell is full, in which case the cell ends
/// with a single overflow marker.
pub fn append_segment(
    grid: &mut Grid,
    key: CellKey,
    segment: EventSegment,
    metrics: CellMetrics,
) -> Placed {
    let Some(cell) = grid.cell_mut(key) else {
        trace!(cell = %key, event = %segment.event.id, "no cell in view, dropping segment");
        return Placed::Dropped;
    };

    if cell.has_overflow() {
        return Placed::Overflowed;
    }

    if metrics.would_overflow(cell.line_count()) {
        // The marker takes the place of the last segment.
        if matches!(cell.items.last(), Some(CellItem::Segment(_))) {
            cell.items.pop();
        }
        cell.items.push(CellItem::Overflow(OverflowMarker {
            week_of: segment.event.start.date(),
        }));
        trace!(cell = %key.content_id(), "cell full, overflow marker added");
        return Placed::Overflowed;
    }

    cell.items.push(CellItem::Segment(segment));
    Placed::Appended
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::EventStatus;
    use crate::layout::fit::TerminalMeasure;
    use crate::layout::grid::Grid;
    use chrono::NaiveDateTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(d: NaiveDate, h: u32) -> NaiveDateTime {
        d.and_hms_opt(h, 0, 0).unwrap()
    }

    fn event(
        title: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        all_day: bool,
    ) -> CalendarEvent {
        CalendarEvent {
            id: title.to_lowercase(),
            title: title.to_string(),
            start,
            end,
            is_all_day: all_day,
            status: EventStatus::Confirmed,
            location: None,
            notes: None,
        }
    }

    fn roomy() -> CellMetrics {
        CellMetrics {
            width: 40,
            height: 20,
            line_height: 1,
            bottom_margin: 0,
        }
    }

    fn positions(grid: &Grid) -> Vec<(String, SpanPosition)> {
        grid.cells()
            .flat_map(|c| {
                c.items.iter().filter_map(move |i| match i {
                    CellItem::Segment(s) => Some((c.key.to_string(), s.position)),
                    CellItem::Overflow(_) => None,
                })
            })
            .collect()
    }

    #[test]
    fn two_day_event_gets_first_and_last() {
        let mut grid = Grid::month(date(2023, 2, 1), date(2023, 2, 1));
        let ev = event("Offsite", at(date(2023, 2, 10), 0), at(date(2023, 2, 12), 0), true);
        place_events(&mut grid, &[ev], 0, roomy(), &TerminalMeasure);

        assert_eq!(
            positions(&grid),
            vec![
                ("20230210".to_string(), SpanPosition::First),
                ("20230211".to_string(), SpanPosition::Last),
            ]
        );
    }

    #[test]
    fn long_event_tags_middles() {
        let mut grid = Grid::month(date(2023, 2, 1), date(2023, 2, 1));
        let ev = event("Conf", at(date(2023, 2, 6), 0), at(date(2023, 2, 10), 0), true);
        place_events(&mut grid, &[ev], 0, roomy(), &TerminalMeasure);

        let tags: Vec<_> = positions(&grid).into_iter().map(|(_, p)| p).collect();
        assert_eq!(
            tags,
            vec![
                SpanPosition::First,
                SpanPosition::Middle,
                SpanPosition::Middle,
                SpanPosition::Last
            ]
        );
    }

    #[test]
    fn segment_count_is_floored_day_difference() {
        let d = date(2023, 2, 10);
        assert_eq!(segment_count(&event("a", at(d, 9), at(d, 10), false)), 1);
        assert_eq!(span_days(&event("a", at(d, 9), at(d, 10), false)), 0);
        assert_eq!(segment_count(&event("a", at(d, 0), at(date(2023, 2, 11), 0), true)), 1);
        assert_eq!(segment_count(&event("a", at(d, 9), at(date(2023, 2, 12), 8), false)), 1);
        assert_eq!(segment_count(&event("a", at(d, 9), at(date(2023, 2, 12), 9), false)), 2);
        assert_eq!(segment_count(&event("a", at(d, 9), at(d, 8), false)), 1);
    }

    #[test]
    fn single_day_event_is_single() {
        let mut grid = Grid::week(date(2023, 2, 10), date(2023, 2, 10));
        let d = date(2023, 2, 10);
        let lunch = event("Lunch", at(d, 12), at(d, 13), false);
        place_events(&mut grid, &[lunch], 2, roomy(), &TerminalMeasure);

        let cell = grid.cell(d.into()).unwrap();
        let CellItem::Segment(seg) = &cell.items[0] else {
            panic!("expected a segment");
        };
        assert_eq!(seg.position, SpanPosition::Single);
        assert_eq!(seg.label, " 12 Lunch");
        assert_eq!(seg.feed, 2);
        assert_eq!(seg.classes(), vec!["eventItem"]);
    }

    #[test]
    fn cancelled_events_never_place() {
        let mut grid = Grid::month(date(2023, 2, 1), date(2023, 2, 1));
        let d = date(2023, 2, 10);
        let mut ev = event("Gone", at(d, 9), at(d, 10), false);
        ev.status = EventStatus::Cancelled;
        assert_eq!(place_events(&mut grid, &[ev], 0, roomy(), &TerminalMeasure), 0);
        assert!(grid.cells().all(|c| c.items.is_empty()));
    }

    #[test]
    fn segments_outside_the_month_are_dropped() {
        let mut grid = Grid::month(date(2023, 2, 1), date(2023, 2, 1));
        let ev = event("Trip", at(date(2023, 2, 27), 0), at(date(2023, 3, 3), 0), true);
        let placed = place_event(&mut grid, &Arc::new(ev), 0, roomy(), &TerminalMeasure);
        assert_eq!(
            placed,
            vec![Placed::Appended, Placed::Appended, Placed::Dropped, Placed::Dropped]
        );
    }

    #[test]
    fn full_cell_collapses_into_one_marker() {
        let mut grid = Grid::month(date(2023, 2, 1), date(2023, 2, 1));
        let d = date(2023, 2, 10);
        let metrics = CellMetrics {
            width: 20,
            height: 4,
            line_height: 1,
            bottom_margin: 0,
        };
        let events: Vec<_> = (8..14)
            .map(|h| event(&format!("E{}", h), at(d, h), at(d, h + 1), false))
            .collect();
        place_events(&mut grid, &events, 0, metrics, &TerminalMeasure);

        let cell = grid.cell(d.into()).unwrap();
        // Day number + E8 + E9 + E10 fills 4 lines; E11 replaces E10 with the marker.
        assert_eq!(cell.items.len(), 3);
        assert_eq!(cell.items.iter().filter(|i| i.is_overflow()).count(), 1);
        assert!(cell.items.last().unwrap().is_overflow());
        assert_eq!(cell.items.last().unwrap().label(), "more");
        assert!(!metrics.would_overflow(cell.line_count() - 1));
    }

    #[test]
    fn marker_points_at_the_suppressed_event() {
        let mut grid = Grid::week(date(2023, 2, 10), date(2023, 2, 10));
        let d = date(2023, 2, 10);
        let metrics = CellMetrics {
            width: 20,
            height: 0,
            line_height: 1,
            bottom_margin: 0,
        };
        let a = event("A", at(d, 9), at(d, 10), false);
        place_events(&mut grid, &[a], 0, metrics, &TerminalMeasure);
        let cell = grid.cell(d.into()).unwrap();
        assert_eq!(
            cell.items,
            vec![CellItem::Overflow(OverflowMarker { week_of: d })]
        );
    }

    #[test]
    fn labels_are_fitted_to_cell_width() {
        let mut grid = Grid::week(date(2023, 2, 10), date(2023, 2, 10));
        let d = date(2023, 2, 10);
        let metrics = CellMetrics {
            width: 12,
            ..roomy()
        };
        let ev = event("Team Meeting with Design Review", at(d, 14), at(d, 15), false);
        place_events(&mut grid, &[ev], 0, metrics, &TerminalMeasure);
        let cell = grid.cell(d.into()).unwrap();
        assert_eq!(cell.items[0].label(), " 2p Team...");
    }

    #[test]
    fn placing_twice_on_fresh_grids_is_identical() {
        let d = date(2023, 2, 10);
        let events = vec![
            event("A", at(d, 9), at(d, 10), false),
            event("B", at(d, 0), at(date(2023, 2, 13), 0), true),
        ];
        let build = || {
            let mut grid = Grid::month(d, d);
            place_events(&mut grid, &events, 0, roomy(), &TerminalMeasure);
            grid
        };
        assert_eq!(build(), build());

        let mut again = build();
        again.clear();
        place_events(&mut again, &events, 0, roomy(), &TerminalMeasure);
        assert_eq!(again, build());
    }
}
