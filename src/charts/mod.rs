//! Charts module - chart descriptors and text plotting

mod plotter;

pub use plotter::{
    ChartData, ChartKind, ChartPlotter, Series, DONUT_HOLE, NEGATIVE_COLOR, PALETTE,
    POSITIVE_COLOR, PROFIT_COLOR, SALES_COLOR,
};
