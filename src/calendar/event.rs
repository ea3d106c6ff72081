use chrono::{NaiveDateTime, Timelike};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventStatus {
    #[default]
    Confirmed,
    Tentative,
    Cancelled,
}

impl EventStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "confirmed" => Some(Self::Confirmed),
            "tentative" => Some(Self::Tentative),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub is_all_day: bool,
    pub status: EventStatus,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl CalendarEvent {
    pub fn is_cancelled(&self) -> bool {
        self.status == EventStatus::Cancelled
    }

    pub fn duration_display(&self) -> String {
        if self.is_all_day {
            "All day".to_string()
        } else {
            let start = self.start.format("%H:%M");
            let end = self.end.format("%H:%M");
            format!("{} - {}", start, end)
        }
    }

    /// Compact start time shown in front of the title inside a date cell:
    /// `"09 "`, `"09:30 "`, `"1p "`, `"1:45p "`. Empty for all-day events.
    pub fn time_prefix(&self) -> String {
        if self.is_all_day {
            return String::new();
        }

        let hour = self.start.hour();
        let minute = self.start.minute();

        if hour > 12 {
            if minute != 0 {
                format!("{}:{:02}p ", hour - 12, minute)
            } else {
                format!("{}p ", hour - 12)
            }
        } else if minute != 0 {
            format!("{:02}:{:02} ", hour, minute)
        } else {
            format!("{:02} ", hour)
        }
    }

    /// Text placed in a date cell before fitting.
    pub fn cell_label(&self) -> String {
        format!(" {}{}", self.time_prefix(), self.title)
    }
}
