pub mod calendar;
pub mod event;
pub mod feed;

pub use calendar::FeedInfo;
pub use event::{CalendarEvent, EventStatus};
pub use feed::{EventSource, FeedError, FeedFuture, FeedQuery, FileFeed};
