//! Renderer-independent month/week grids and the placement of event labels
//! into their date cells.

pub mod fit;
pub mod grid;
pub mod placement;

pub use fit::{fit_text, CellMetrics, TerminalMeasure, TextMeasure};
pub use grid::{CellKey, DateCell, Grid, GridSlot, ViewMode};
pub use placement::{CellItem, EventSegment, OverflowMarker, SpanPosition};
