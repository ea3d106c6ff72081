use ratatui::style::Color;

/// A configured feed together with the label index its segments carry.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedInfo {
    pub id: String,
    pub label: usize,
    pub color: Color,
}

impl FeedInfo {
    /// Identifier shared by every segment of this feed, `cal{label}`.
    pub fn css_id(&self) -> String {
        format!("cal{}", self.label)
    }
}
