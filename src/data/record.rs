//! Order records and the immutable snapshot every aggregation reads from.

use crate::data::schema::Capabilities;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// One transaction line after coercion.
///
/// Sales and profit are always present; a row without them never makes it
/// into a snapshot. Everything else is optional because the column may be
/// absent from the source or the cell may fail to parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderRecord {
    pub order_date: Option<NaiveDate>,
    pub ship_date: Option<NaiveDate>,
    pub ship_mode: Option<String>,
    pub sales: f64,
    pub profit: f64,
    pub discount: Option<f64>,
    pub shipping_cost: Option<f64>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub region: Option<String>,
    pub state: Option<String>,
    pub segment: Option<String>,
}

impl OrderRecord {
    /// Shipping duration in calendar days, when both dates are known.
    pub fn shipping_days(&self) -> Option<i64> {
        match (self.order_date, self.ship_date) {
            (Some(ordered), Some(shipped)) => Some((shipped - ordered).num_days()),
            _ => None,
        }
    }
}

/// A loaded orders table. Built once per load and never mutated.
#[derive(Debug, Clone)]
pub struct OrderSnapshot {
    records: Vec<OrderRecord>,
    capabilities: Capabilities,
    dropped_rows: usize,
    source: String,
    loaded_at: DateTime<Utc>,
}

impl OrderSnapshot {
    pub fn new(
        records: Vec<OrderRecord>,
        capabilities: Capabilities,
        dropped_rows: usize,
        source: impl Into<String>,
    ) -> Self {
        Self {
            records,
            capabilities,
            dropped_rows,
            source: source.into(),
            loaded_at: Utc::now(),
        }
    }

    /// Snapshot over in-memory records with every field available.
    pub fn from_records(records: Vec<OrderRecord>) -> Self {
        Self::new(records, Capabilities::full(), 0, "memory")
    }

    pub fn records(&self) -> &[OrderRecord] {
        &self.records
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Rows excluded at load time for missing sales or profit.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipping_days_needs_both_dates() {
        let mut record = OrderRecord {
            order_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ship_date: NaiveDate::from_ymd_opt(2024, 1, 5),
            ..Default::default()
        };
        assert_eq!(record.shipping_days(), Some(4));

        record.ship_date = None;
        assert_eq!(record.shipping_days(), None);
    }
}
