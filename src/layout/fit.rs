use unicode_width::UnicodeWidthStr;

pub const ELLIPSIS: &str = "...";

pub trait TextMeasure {
    fn width(&self, text: &str) -> u16;
}

/// Display width in terminal columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalMeasure;

impl TextMeasure for TerminalMeasure {
    fn width(&self, text: &str) -> u16 {
        UnicodeWidthStr::width(text).min(u16::MAX as usize) as u16
    }
}

/// Space available inside one date cell, in the units of the measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMetrics {
    pub width: u16,
    pub height: u16,
    pub line_height: u16,
    pub bottom_margin: u16,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            width: 16,
            height: 5,
            line_height: 1,
            bottom_margin: 0,
        }
    }
}

impl CellMetrics {
    /// True when one more line would not fit below `lines` existing lines.
    pub fn would_overflow(&self, lines: u16) -> bool {
        let line = u64::from(self.line_height);
        let needed = u64::from(lines) * line + line + u64::from(self.bottom_margin);
        u64::from(self.height) < needed
    }
}

/// Shorten `text` until it fits in `limit`, ending it with an ellipsis.
///
/// The width of `prefix + "..."` never decreases as the prefix grows, so the
/// longest fitting prefix is found by binary search over char boundaries.
pub fn fit_text(text: &str, limit: u16, measure: &dyn TextMeasure) -> String {
    if measure.width(text) <= limit {
        return text.to_string();
    }

    let boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let candidate = |count: usize| -> String {
        let end = boundaries.get(count).copied().unwrap_or(text.len());
        format!("{}{}", text[..end].trim_end(), ELLIPSIS)
    };

    // Invariant: `lo` chars fit (if any do), `hi` chars do not.
    let mut lo = 0usize;
    let mut hi = boundaries.len();
    if measure.width(&candidate(0)) > limit {
        return fit_ellipsis(limit, measure);
    }
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if measure.width(&candidate(mid)) <= limit {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    candidate(lo)
}

fn fit_ellipsis(limit: u16, measure: &dyn TextMeasure) -> String {
    let mut dots = ELLIPSIS.to_string();
    while !dots.is_empty() && measure.width(&dots) > limit {
        dots.pop();
    }
    dots
}
