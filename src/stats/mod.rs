//! Stats module - aggregation pipeline and statistical helpers

pub mod aggregate;
mod calculator;

pub use aggregate::{
    aggregate, discount_impact, loss_states, loss_subcategories, profit_margin,
    sort_by_profit_ascending, yearly_performance, AggregateRow, BucketRow, Dimension,
    PairAggregateRow, Totals, YearRow,
};
pub use calculator::{
    CorrelationMatrix, DescriptiveStats, ShipModeRow, ShippingReport, StatsCalculator,
};
