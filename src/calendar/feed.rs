use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use super::event::{CalendarEvent, EventStatus};

/// Upper bound on events returned for one query.
pub const DEFAULT_MAX_RESULTS: usize = 500;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed '{0}' not found")]
    NotFound(String),
    #[error("failed to read feed '{feed}': {source}")]
    Io {
        feed: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse feed '{feed}': {message}")]
    Parse { feed: String, message: String },
    #[error("invalid date '{value}' in feed '{feed}'")]
    InvalidDate { feed: String, value: String },
}

impl FeedError {
    /// Message shown in the status line.
    pub fn status_text(&self) -> String {
        self.to_string()
    }
}

/// Events whose start lies in `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedQuery {
    pub feed_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub max_results: usize,
}

impl FeedQuery {
    pub fn new(feed_id: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            feed_id: feed_id.into(),
            start,
            end,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn matches(&self, event: &CalendarEvent) -> bool {
        let date = event.start.date();
        date >= self.start && date < self.end
    }

    /// Filter, order by start and cap a raw event list the way every source
    /// is expected to answer a query.
    pub fn apply(&self, mut events: Vec<CalendarEvent>) -> Vec<CalendarEvent> {
        events.retain(|e| self.matches(e));
        events.sort_by_key(|e| e.start);
        events.truncate(self.max_results);
        events
    }
}

pub type FeedFuture = Pin<Box<dyn Future<Output = Result<Vec<CalendarEvent>, FeedError>> + Send>>;

pub trait EventSource: Send + Sync {
    fn fetch(&self, query: FeedQuery) -> FeedFuture;
}

/// Reads feeds from `<dir>/<feed id>.toml`.
#[derive(Debug, Clone)]
pub struct FileFeed {
    dir: PathBuf,
}

impl FileFeed {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, feed_id: &str) -> PathBuf {
        self.dir.join(format!("{}.toml", feed_id))
    }
}

impl EventSource for FileFeed {
    fn fetch(&self, query: FeedQuery) -> FeedFuture {
        let path = self.path_for(&query.feed_id);
        Box::pin(async move { load_feed(path, query).await })
    }
}

#[instrument(skip(query), fields(feed = %query.feed_id, start = %query.start, end = %query.end))]
async fn load_feed(path: PathBuf, query: FeedQuery) -> Result<Vec<CalendarEvent>, FeedError> {
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FeedError::NotFound(query.feed_id));
        }
        Err(source) => {
            return Err(FeedError::Io {
                feed: query.feed_id,
                source,
            })
        }
    };

    let events = parse_feed(&query.feed_id, &content)?;
    let total = events.len();
    let events = query.apply(events);
    debug!(total, matched = events.len(), "feed loaded");
    Ok(events)
}

// ── TOML feed types ──

#[derive(Debug, Deserialize, Default)]
struct FeedFile {
    #[serde(default)]
    event: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: Option<String>,
    title: String,
    start: String,
    end: Option<String>,
    status: Option<String>,
    location: Option<String>,
    notes: Option<String>,
}

/// Parse the contents of a feed file.
pub fn parse_feed(feed: &str, content: &str) -> Result<Vec<CalendarEvent>, FeedError> {
    let file: FeedFile = toml::from_str(content).map_err(|e| FeedError::Parse {
        feed: feed.to_string(),
        message: e.to_string(),
    })?;

    file.event
        .into_iter()
        .enumerate()
        .map(|(i, raw)| convert_event(feed, i, raw))
        .collect()
}

fn convert_event(feed: &str, index: usize, raw: RawEvent) -> Result<CalendarEvent, FeedError> {
    let (start, is_all_day) = parse_when(feed, &raw.start)?;
    let end = match raw.end.as_deref() {
        Some(s) => parse_when(feed, s)?.0,
        // All-day events without an end last one day; timed ones are instants.
        None if is_all_day => start + chrono::Duration::days(1),
        None => start,
    };

    let status = match raw.status.as_deref() {
        Some(s) => EventStatus::parse(s).ok_or_else(|| FeedError::Parse {
            feed: feed.to_string(),
            message: format!("unknown status '{}'", s),
        })?,
        None => EventStatus::Confirmed,
    };

    Ok(CalendarEvent {
        id: raw.id.unwrap_or_else(|| format!("{}-{}", feed, index)),
        title: raw.title,
        start,
        end,
        is_all_day,
        status,
        location: raw.location.filter(|s| !s.is_empty()),
        notes: raw.notes.filter(|s| !s.is_empty()),
    })
}

/// A date-only value marks an all-day event.
fn parse_when(feed: &str, value: &str) -> Result<(NaiveDateTime, bool), FeedError> {
    let value = value.trim();
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok((dt, false));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| (dt, true))
        .ok_or_else(|| FeedError::InvalidDate {
            feed: feed.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[event]]
id = "standup"
title = "Standup"
start = "2023-02-10T09:30"
end = "2023-02-10T09:45"

[[event]]
title = "Offsite"
start = "2023-02-10"
end = "2023-02-12"
location = ""

[[event]]
title = "Dropped"
start = "2023-02-11T10:00:00"
status = "cancelled"
"#;

    #[test]
    fn parses_timed_all_day_and_cancelled_events() {
        let events = parse_feed("work", SAMPLE).unwrap();
        assert_eq!(events.len(), 3);

        assert_eq!(events[0].id, "standup");
        assert!(!events[0].is_all_day);

        assert_eq!(events[1].id, "work-1");
        assert!(events[1].is_all_day);
        assert_eq!(events[1].end.date(), NaiveDate::from_ymd_opt(2023, 2, 12).unwrap());
        assert_eq!(events[1].location, None);

        assert!(events[2].is_cancelled());
        assert_eq!(events[2].end, events[2].start);
    }

    #[test]
    fn rejects_malformed_dates() {
        let err = parse_feed("work", "[[event]]\ntitle = \"x\"\nstart = \"Feb 10\"\n").unwrap_err();
        assert!(matches!(err, FeedError::InvalidDate { .. }));
    }

    #[test]
    fn query_filters_on_start_and_orders() {
        let events = parse_feed("work", SAMPLE).unwrap();
        let query = FeedQuery::new(
            "work",
            NaiveDate::from_ymd_opt(2023, 2, 11).unwrap(),
            NaiveDate::from_ymd_opt(2023, 2, 12).unwrap(),
        );
        let picked = query.apply(events);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].title, "Dropped");
    }
}
