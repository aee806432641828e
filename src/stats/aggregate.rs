//! Aggregation Module
//! Group-by rollups over order records: per-dimension totals, loss
//! drill-downs, discount buckets and the yearly trend.

use crate::data::{Field, OrderRecord};
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of fixed-width discount buckets over [0, 1].
pub const DISCOUNT_BUCKETS: usize = 10;

/// Profit as a percentage of sales; 0 when there are no sales.
pub fn profit_margin(sales: f64, profit: f64) -> f64 {
    if sales == 0.0 {
        0.0
    } else {
        profit / sales * 100.0
    }
}

/// Running sums for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub sales: f64,
    pub profit: f64,
    pub orders: usize,
}

impl Totals {
    pub fn add(&mut self, record: &OrderRecord) {
        self.sales += record.sales;
        self.profit += record.profit;
        self.orders += 1;
    }

    pub fn margin(&self) -> f64 {
        profit_margin(self.sales, self.profit)
    }

    pub fn of<'a>(records: impl IntoIterator<Item = &'a OrderRecord>) -> Self {
        let mut totals = Totals::default();
        for record in records {
            totals.add(record);
        }
        totals
    }
}

/// Categorical columns an aggregate can be keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Category,
    SubCategory,
    Region,
    State,
    Segment,
    ShipMode,
}

impl Dimension {
    pub fn field(self) -> Field {
        match self {
            Dimension::Category => Field::Category,
            Dimension::SubCategory => Field::SubCategory,
            Dimension::Region => Field::Region,
            Dimension::State => Field::State,
            Dimension::Segment => Field::Segment,
            Dimension::ShipMode => Field::ShipMode,
        }
    }

    pub fn key(self, record: &OrderRecord) -> Option<&str> {
        let value = match self {
            Dimension::Category => &record.category,
            Dimension::SubCategory => &record.sub_category,
            Dimension::Region => &record.region,
            Dimension::State => &record.state,
            Dimension::Segment => &record.segment,
            Dimension::ShipMode => &record.ship_mode,
        };
        value.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: String,
    pub sales: f64,
    pub profit: f64,
    pub profit_margin: f64,
    pub orders: usize,
}

impl AggregateRow {
    fn new(key: String, totals: Totals) -> Self {
        Self {
            key,
            sales: totals.sales,
            profit: totals.profit,
            profit_margin: totals.margin(),
            orders: totals.orders,
        }
    }
}

/// Aggregate keyed by a `(primary, secondary)` pair, e.g. category and
/// sub-category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairAggregateRow {
    pub primary: String,
    pub secondary: String,
    pub sales: f64,
    pub profit: f64,
    pub profit_margin: f64,
    pub orders: usize,
}

fn rollup<'a, K, I, F>(records: I, key: F) -> BTreeMap<K, Totals>
where
    K: Ord,
    I: IntoIterator<Item = &'a OrderRecord>,
    F: Fn(&'a OrderRecord) -> Option<K>,
{
    let mut groups: BTreeMap<K, Totals> = BTreeMap::new();
    for record in records {
        if let Some(k) = key(record) {
            groups.entry(k).or_default().add(record);
        }
    }
    groups
}

fn to_rows(groups: BTreeMap<&str, Totals>) -> Vec<AggregateRow> {
    groups
        .into_iter()
        .map(|(key, totals)| AggregateRow::new(key.to_string(), totals))
        .collect()
}

/// Sales, profit and margin per distinct value of `dimension`, ordered by
/// key. Records without a value for the dimension are left out.
pub fn aggregate(records: &[OrderRecord], dimension: Dimension) -> Vec<AggregateRow> {
    to_rows(rollup(records, |r| dimension.key(r)))
}

fn losses(records: &[OrderRecord]) -> impl Iterator<Item = &OrderRecord> {
    records.iter().filter(|r| r.profit < 0.0)
}

/// States aggregated over loss-making records only.
pub fn loss_states(records: &[OrderRecord]) -> Vec<AggregateRow> {
    to_rows(rollup(losses(records), |r| Dimension::State.key(r)))
}

/// `(category, sub-category)` pairs aggregated over loss-making records only.
pub fn loss_subcategories(records: &[OrderRecord]) -> Vec<PairAggregateRow> {
    let groups = rollup(losses(records), |r| {
        Some((r.category.as_deref()?, r.sub_category.as_deref()?))
    });
    groups
        .into_iter()
        .map(|((primary, secondary), totals)| PairAggregateRow {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            sales: totals.sales,
            profit: totals.profit,
            profit_margin: totals.margin(),
            orders: totals.orders,
        })
        .collect()
}

/// Order rows by profit, most negative first.
pub fn sort_by_profit_ascending(rows: &mut [AggregateRow]) {
    rows.sort_by(|a, b| a.profit.total_cmp(&b.profit));
}

/// Lower bound of bucket `index`.
fn bucket_edge(index: usize) -> f64 {
    index as f64 / DISCOUNT_BUCKETS as f64
}

/// Bucket index for a discount fraction.
///
/// Buckets are lower-inclusive and upper-exclusive, except the last one
/// which also takes 1.0. Values outside [0, 1] have no bucket.
pub fn discount_bucket(discount: f64) -> Option<usize> {
    if !(0.0..=1.0).contains(&discount) {
        return None;
    }
    (0..DISCOUNT_BUCKETS)
        .rev()
        .find(|&index| discount >= bucket_edge(index))
}

pub fn bucket_label(index: usize) -> String {
    let step = 100 / DISCOUNT_BUCKETS;
    format!("{}-{}%", index * step, (index + 1) * step)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketRow {
    pub label: String,
    pub lower: f64,
    pub upper: f64,
    pub sales: f64,
    pub profit: f64,
    pub profit_margin: f64,
    pub orders: usize,
}

/// Sales, profit and margin for each of the ten discount buckets, in
/// bucket order. Empty buckets are reported with zero totals.
pub fn discount_impact(records: &[OrderRecord]) -> Vec<BucketRow> {
    let groups = rollup(records, |r| r.discount.and_then(discount_bucket));
    (0..DISCOUNT_BUCKETS)
        .map(|index| {
            let totals = groups.get(&index).copied().unwrap_or_default();
            BucketRow {
                label: bucket_label(index),
                lower: bucket_edge(index),
                upper: bucket_edge(index + 1),
                sales: totals.sales,
                profit: totals.profit,
                profit_margin: totals.margin(),
                orders: totals.orders,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearRow {
    pub year: i32,
    pub sales: f64,
    pub profit: f64,
    pub profit_margin: f64,
}

/// Sales and profit per calendar year of the order date.
pub fn yearly_performance(records: &[OrderRecord]) -> Vec<YearRow> {
    rollup(records, |r| r.order_date.map(|d| d.year()))
        .into_iter()
        .map(|(year, totals)| YearRow {
            year,
            sales: totals.sales,
            profit: totals.profit,
            profit_margin: totals.margin(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn order(sales: f64, profit: f64, category: &str) -> OrderRecord {
        OrderRecord {
            sales,
            profit,
            category: Some(category.to_string()),
            ..Default::default()
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_aggregate_by_category_example() {
        let records = vec![order(100.0, 20.0, "A"), order(200.0, -10.0, "A"), order(50.0, 5.0, "B")];

        let rows = aggregate(&records, Dimension::Category);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "A");
        assert!(close(rows[0].sales, 300.0));
        assert!(close(rows[0].profit, 10.0));
        assert_eq!(format!("{:.2}", rows[0].profit_margin), "3.33");
        assert_eq!(rows[0].orders, 2);
        assert_eq!(rows[1].key, "B");
        assert_eq!(format!("{:.2}", rows[1].profit_margin), "10.00");
    }

    #[test]
    fn test_aggregate_partitions_profit() {
        let regions = ["West", "East", "Central", "South"];
        let records: Vec<OrderRecord> = (0..40)
            .map(|i| OrderRecord {
                sales: (i * 7 % 13) as f64 * 10.0,
                profit: (i as f64 - 20.0) * 1.5,
                region: Some(regions[i % regions.len()].to_string()),
                ..Default::default()
            })
            .collect();

        let rows = aggregate(&records, Dimension::Region);
        let grouped: f64 = rows.iter().map(|r| r.profit).sum();
        let total: f64 = records.iter().map(|r| r.profit).sum();

        assert_eq!(rows.len(), 4);
        assert!(close(grouped, total));
        assert_eq!(rows.iter().map(|r| r.orders).sum::<usize>(), records.len());
    }

    #[test]
    fn test_records_without_key_are_not_grouped() {
        let mut records = vec![order(10.0, 1.0, "A")];
        records.push(OrderRecord {
            sales: 5.0,
            profit: 1.0,
            ..Default::default()
        });
        let rows = aggregate(&records, Dimension::Category);
        assert_eq!(rows.len(), 1);
        assert!(close(rows[0].sales, 10.0));
    }

    #[test]
    fn test_zero_sales_margin_is_zero() {
        assert_eq!(profit_margin(0.0, -25.0), 0.0);
        let rows = aggregate(&[order(0.0, -5.0, "Free")], Dimension::Category);
        assert_eq!(rows[0].profit_margin, 0.0);
    }

    #[test]
    fn test_loss_views_filter_negative_profit() {
        let records = vec![
            OrderRecord {
                sales: 100.0,
                profit: -20.0,
                state: Some("Texas".into()),
                category: Some("Furniture".into()),
                sub_category: Some("Tables".into()),
                ..Default::default()
            },
            OrderRecord {
                sales: 300.0,
                profit: 50.0,
                state: Some("Texas".into()),
                category: Some("Furniture".into()),
                sub_category: Some("Tables".into()),
                ..Default::default()
            },
            OrderRecord {
                sales: 40.0,
                profit: -4.0,
                state: Some("Ohio".into()),
                category: Some("Office Supplies".into()),
                sub_category: Some("Binders".into()),
                ..Default::default()
            },
            OrderRecord {
                sales: 0.0,
                profit: -5.0,
                state: Some("Utah".into()),
                category: Some("Technology".into()),
                sub_category: Some("Phones".into()),
                ..Default::default()
            },
        ];

        let states = loss_states(&records);
        assert_eq!(states.len(), 3);
        assert_eq!(states[1].key, "Texas");
        assert!(close(states[1].sales, 100.0));
        assert!(close(states[1].profit_margin, -20.0));
        assert_eq!(states[2].key, "Utah");
        assert_eq!(states[2].profit, -5.0);
        assert_eq!(states[2].profit_margin, 0.0);

        let subs = loss_subcategories(&records);
        assert_eq!(subs.len(), 3);
        assert_eq!(subs[0].primary, "Furniture");
        assert_eq!(subs[0].secondary, "Tables");
        assert!(close(subs[0].profit, -20.0));
        assert_eq!(subs[2].secondary, "Phones");
        assert_eq!(subs[2].profit_margin, 0.0);
    }

    #[test]
    fn test_loss_views_on_profitable_data_are_empty() {
        let records = vec![order(10.0, 1.0, "A")];
        assert!(loss_states(&records).is_empty());
        assert!(loss_subcategories(&records).is_empty());
        assert!(loss_states(&[]).is_empty());
    }

    #[test]
    fn test_sort_by_profit_ascending() {
        let mut rows = aggregate(
            &[order(1.0, 5.0, "a"), order(1.0, -3.0, "b"), order(1.0, 0.0, "c")],
            Dimension::Category,
        );
        sort_by_profit_ascending(&mut rows);
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_discount_bucket_edges() {
        assert_eq!(discount_bucket(0.0), Some(0));
        assert_eq!(discount_bucket(0.09999), Some(0));
        assert_eq!(discount_bucket(0.1), Some(1));
        assert_eq!(discount_bucket(0.2), Some(2));
        assert_eq!(discount_bucket(0.3), Some(3));
        assert_eq!(discount_bucket(0.7), Some(7));
        assert_eq!(discount_bucket(0.9), Some(9));
        assert_eq!(discount_bucket(1.0), Some(9));
        assert_eq!(discount_bucket(-0.01), None);
        assert_eq!(discount_bucket(1.01), None);
        assert_eq!(discount_bucket(f64::NAN), None);
    }

    #[test]
    fn test_every_discount_maps_to_one_bucket() {
        for step in 0..=1000 {
            let discount = step as f64 / 1000.0;
            let index = discount_bucket(discount).unwrap();
            let lower = bucket_edge(index);
            let upper = bucket_edge(index + 1);
            assert!(discount >= lower, "{} below bucket {}", discount, index);
            assert!(discount < upper || (index == 9 && discount == 1.0));
        }
    }

    #[test]
    fn test_discount_impact_keeps_bucket_order() {
        let records = vec![
            OrderRecord {
                sales: 100.0,
                profit: 20.0,
                discount: Some(0.0),
                ..Default::default()
            },
            OrderRecord {
                sales: 100.0,
                profit: -30.0,
                discount: Some(0.45),
                ..Default::default()
            },
            OrderRecord {
                sales: 50.0,
                profit: 1.0,
                discount: None,
                ..Default::default()
            },
        ];

        let rows = discount_impact(&records);

        assert_eq!(rows.len(), DISCOUNT_BUCKETS);
        assert_eq!(rows[0].label, "0-10%");
        assert_eq!(rows[9].label, "90-100%");
        assert!(close(rows[0].profit_margin, 20.0));
        assert!(close(rows[4].profit_margin, -30.0));
        assert_eq!(rows[5].orders, 0);
        assert_eq!(rows[5].profit_margin, 0.0);
        assert_eq!(rows.iter().map(|r| r.orders).sum::<usize>(), 2);
    }

    #[test]
    fn test_yearly_performance_sorted_by_year() {
        let dated = |y: i32, sales: f64| OrderRecord {
            sales,
            profit: sales / 10.0,
            order_date: NaiveDate::from_ymd_opt(y, 3, 1),
            ..Default::default()
        };
        let records = vec![dated(2017, 10.0), dated(2015, 5.0), dated(2017, 30.0)];

        let years = yearly_performance(&records);

        assert_eq!(years.len(), 2);
        assert_eq!(years[0].year, 2015);
        assert_eq!(years[1].year, 2017);
        assert!(close(years[1].sales, 40.0));
        assert!(close(years[1].profit_margin, 10.0));
    }
}
