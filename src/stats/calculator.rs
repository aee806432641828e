//! Statistics Calculator Module
//! Handles descriptive statistics, shipping durations and the Pearson
//! correlation matrix.

use crate::data::OrderRecord;
use crate::stats::aggregate::{Dimension, Totals};
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Minimum complete rows before a correlation is computed.
pub const MIN_CORRELATION_ROWS: usize = 2;

/// Columns of the correlation matrix, in order.
pub const CORRELATION_COLUMNS: [&str; 3] = ["Sales", "Profit", "Discount"];

/// Descriptive statistics for a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

/// Ship-mode performance row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipModeRow {
    pub mode: String,
    pub sales: f64,
    pub profit: f64,
    pub profit_margin: f64,
    pub orders: usize,
    /// Mean shipping days over rows with both dates, if any.
    pub avg_days: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShippingReport {
    pub modes: Vec<ShipModeRow>,
    /// Duration statistics over every dated row, `None` when there are none.
    pub overall: Option<DescriptiveStats>,
}

/// Pairwise Pearson correlations over sales, profit and discount.
///
/// A cell is `None` when either column has zero variance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: [&'static str; 3],
    pub values: [[Option<f64>; 3]; 3],
    pub rows_used: usize,
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> Option<DescriptiveStats> {
        let n = values.len();
        if n == 0 {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mean = values.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        let std = if n > 1 { values.iter().std_dev() } else { 0.0 };

        Some(DescriptiveStats {
            count: n,
            mean,
            median,
            std,
        })
    }

    /// Sample Pearson correlation, `None` for zero variance or short input.
    pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
        if xs.len() != ys.len() || xs.len() < MIN_CORRELATION_ROWS {
            return None;
        }

        let sx = xs.iter().std_dev();
        let sy = ys.iter().std_dev();
        if !(sx > 0.0 && sy > 0.0) {
            return None;
        }

        let r = xs.iter().covariance(ys.iter()) / (sx * sy);
        r.is_finite().then(|| r.clamp(-1.0, 1.0))
    }

    /// Correlation matrix over rows where sales, profit and discount are all
    /// present. Returns `None` with fewer than two such rows.
    pub fn correlation_matrix(records: &[OrderRecord]) -> Option<CorrelationMatrix> {
        let complete: Vec<[f64; 3]> = records
            .iter()
            .filter_map(|r| r.discount.map(|d| [r.sales, r.profit, d]))
            .collect();
        if complete.len() < MIN_CORRELATION_ROWS {
            return None;
        }

        let columns: Vec<Vec<f64>> = (0..3)
            .map(|i| complete.iter().map(|row| row[i]).collect())
            .collect();

        let mut values = [[None; 3]; 3];
        for i in 0..3 {
            values[i][i] = Self::pearson(&columns[i], &columns[i]).map(|_| 1.0);
            for j in (i + 1)..3 {
                let r = Self::pearson(&columns[i], &columns[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Some(CorrelationMatrix {
            columns: CORRELATION_COLUMNS,
            values,
            rows_used: complete.len(),
        })
    }

    /// Per-ship-mode totals with mean shipping time, plus overall mean and
    /// median duration.
    pub fn shipping_performance(records: &[OrderRecord]) -> ShippingReport {
        let mut groups: BTreeMap<&str, (Totals, Vec<f64>)> = BTreeMap::new();
        let mut all_days = Vec::new();

        for record in records {
            let days = record.shipping_days().map(|d| d as f64);
            if let Some(days) = days {
                all_days.push(days);
            }
            if let Some(mode) = Dimension::ShipMode.key(record) {
                let (totals, durations) = groups.entry(mode).or_default();
                totals.add(record);
                durations.extend(days);
            }
        }

        let modes = groups
            .into_iter()
            .map(|(mode, (totals, durations))| ShipModeRow {
                mode: mode.to_string(),
                sales: totals.sales,
                profit: totals.profit,
                profit_margin: totals.margin(),
                orders: totals.orders,
                avg_days: Self::compute_descriptive_stats(&durations).map(|s| s.mean),
            })
            .collect();

        ShippingReport {
            modes,
            overall: Self::compute_descriptive_stats(&all_days),
        }
    }
}
