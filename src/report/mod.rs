//! Report module - view building, formatting and text output

mod format;
mod text;
mod views;

pub use format::{Cell, Formatter, Table, Tone};
pub use text::TextRenderer;
pub use views::{Dashboard, Kpi, View, ViewBuilder, ViewKind, DEFAULT_RECOMMENDATIONS};
