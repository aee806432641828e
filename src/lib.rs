//! Retail Insights - retail orders aggregation & report views
//!
//! Loads an orders table, aggregates it by product, geography, customer,
//! discount and shipping dimensions, and prepares seven report views.

pub mod charts;
pub mod config;
pub mod data;
pub mod report;
pub mod stats;
