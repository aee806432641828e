//! Presentation adapter: display vocabulary, number formatting and tone.

use crate::stats::{AggregateRow, CorrelationMatrix, PairAggregateRow, ShipModeRow};
use serde::Serialize;

pub const SALES_HEADER: &str = "Sales";
pub const PROFIT_HEADER: &str = "Profit";
pub const MARGIN_HEADER: &str = "Profit Margin";
pub const ORDERS_HEADER: &str = "Orders";
pub const AVG_DAYS_HEADER: &str = "Avg Ship Time (days)";

/// How a value should be colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Neutral,
    Positive,
    Negative,
}

impl Tone {
    pub fn of(value: f64) -> Self {
        if value < 0.0 {
            Tone::Negative
        } else {
            Tone::Positive
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub text: String,
    /// Raw number behind the text, for numeric cells.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub tone: Tone,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: None,
            tone: Tone::Neutral,
        }
    }

    pub fn number(text: String, value: f64, tone: Tone) -> Self {
        Self {
            text,
            value: Some(value),
            tone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(title: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            title: title.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

/// Formats numbers into display text.
#[derive(Debug, Clone)]
pub struct Formatter {
    currency_prefix: String,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new("$")
    }
}

impl Formatter {
    pub fn new(currency_prefix: &str) -> Self {
        Self {
            currency_prefix: currency_prefix.to_string(),
        }
    }

    /// `$ 1,234.56`, `$ -17.00`
    pub fn currency(&self, value: f64) -> String {
        format!("{} {}", self.currency_prefix, group_thousands(value))
    }

    /// `12.47%`
    pub fn percent(&self, value: f64) -> String {
        format!("{:.2}%", clean_zero(value))
    }

    /// `3.96 days`
    pub fn days(&self, value: f64) -> String {
        format!("{:.2} days", clean_zero(value))
    }

    pub fn sales_cell(&self, value: f64) -> Cell {
        Cell::number(self.currency(value), value, Tone::Neutral)
    }

    pub fn profit_cell(&self, value: f64) -> Cell {
        Cell::number(self.currency(value), value, Tone::of(value))
    }

    pub fn margin_cell(&self, value: f64) -> Cell {
        Cell::number(self.percent(value), value, Tone::of(value))
    }

    fn count_cell(&self, value: usize) -> Cell {
        Cell::number(value.to_string(), value as f64, Tone::Neutral)
    }

    /// Performance table for a single-key aggregate.
    pub fn aggregate_table(&self, title: &str, key_header: &str, rows: &[AggregateRow]) -> Table {
        let mut table = Table::new(
            title,
            &[key_header, SALES_HEADER, PROFIT_HEADER, MARGIN_HEADER, ORDERS_HEADER],
        );
        table.rows = rows
            .iter()
            .map(|row| {
                vec![
                    Cell::text(&row.key),
                    self.sales_cell(row.sales),
                    self.profit_cell(row.profit),
                    self.margin_cell(row.profit_margin),
                    self.count_cell(row.orders),
                ]
            })
            .collect();
        table
    }

    /// Performance table for a `(primary, secondary)` aggregate.
    pub fn pair_table(
        &self,
        title: &str,
        headers: (&str, &str),
        rows: &[PairAggregateRow],
    ) -> Table {
        let mut table = Table::new(
            title,
            &[headers.0, headers.1, SALES_HEADER, PROFIT_HEADER, MARGIN_HEADER, ORDERS_HEADER],
        );
        table.rows = rows
            .iter()
            .map(|row| {
                vec![
                    Cell::text(&row.primary),
                    Cell::text(&row.secondary),
                    self.sales_cell(row.sales),
                    self.profit_cell(row.profit),
                    self.margin_cell(row.profit_margin),
                    self.count_cell(row.orders),
                ]
            })
            .collect();
        table
    }

    pub fn ship_mode_table(&self, title: &str, rows: &[ShipModeRow]) -> Table {
        let mut table = Table::new(
            title,
            &[
                "Ship Mode",
                SALES_HEADER,
                PROFIT_HEADER,
                MARGIN_HEADER,
                AVG_DAYS_HEADER,
                ORDERS_HEADER,
            ],
        );
        table.rows = rows
            .iter()
            .map(|row| {
                let avg = match row.avg_days {
                    Some(days) => Cell::number(format!("{:.2}", days), days, Tone::Neutral),
                    None => Cell::text("n/a"),
                };
                vec![
                    Cell::text(&row.mode),
                    self.sales_cell(row.sales),
                    self.profit_cell(row.profit),
                    self.margin_cell(row.profit_margin),
                    avg,
                    self.count_cell(row.orders),
                ]
            })
            .collect();
        table
    }

    pub fn correlation_table(&self, title: &str, matrix: &CorrelationMatrix) -> Table {
        let mut headers = vec!["Metric"];
        headers.extend(matrix.columns);
        let mut table = Table::new(title, &headers);
        table.rows = matrix
            .columns
            .iter()
            .zip(matrix.values.iter())
            .map(|(name, values)| {
                let mut row = vec![Cell::text(*name)];
                row.extend(values.iter().map(|value| match value {
                    Some(r) => Cell::number(format!("{:.2}", r), *r, Tone::Neutral),
                    None => Cell::text("n/a"),
                }));
                row
            })
            .collect();
        table
    }
}

fn clean_zero(value: f64) -> f64 {
    // Keeps -0.001 from printing as -0.00
    if value.abs() < 0.005 {
        0.0
    } else {
        value
    }
}

/// Two decimals with comma thousands separators.
fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", clean_zero(value).abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if clean_zero(value) < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_groups_thousands() {
        let fmt = Formatter::new("R$");
        assert_eq!(fmt.currency(2297200.86), "R$ 2,297,200.86");
        assert_eq!(fmt.currency(999.5), "R$ 999.50");
        assert_eq!(fmt.currency(-17725.0), "R$ -17,725.00");
        assert_eq!(fmt.currency(-0.001), "R$ 0.00");
        assert_eq!(fmt.currency(100000.0), "R$ 100,000.00");
    }

    #[test]
    fn test_percent_and_days() {
        let fmt = Formatter::default();
        assert_eq!(fmt.percent(12.4678), "12.47%");
        assert_eq!(fmt.percent(-8.5616), "-8.56%");
        assert_eq!(fmt.percent(-0.0001), "0.00%");
        assert_eq!(fmt.days(3.956), "3.96 days");
    }

    #[test]
    fn test_aggregate_table_tones_negative_profit() {
        let rows = vec![
            AggregateRow {
                key: "Tables".into(),
                sales: 206965.0,
                profit: -17725.0,
                profit_margin: -8.56,
                orders: 3,
            },
            AggregateRow {
                key: "Copiers".into(),
                sales: 100.0,
                profit: 30.0,
                profit_margin: 30.0,
                orders: 1,
            },
        ];

        let table = Formatter::default().aggregate_table("Sub-Categories", "Sub-Category", &rows);

        assert_eq!(
            table.columns,
            vec!["Sub-Category", "Sales", "Profit", "Profit Margin", "Orders"]
        );
        assert_eq!(table.rows[0][0].text, "Tables");
        assert_eq!(table.rows[0][1].tone, Tone::Neutral);
        assert_eq!(table.rows[0][2].tone, Tone::Negative);
        assert_eq!(table.rows[0][3].text, "-8.56%");
        assert_eq!(table.rows[1][2].tone, Tone::Positive);
    }

    #[test]
    fn test_ship_mode_table_without_dates() {
        let rows = vec![ShipModeRow {
            mode: "Same Day".into(),
            sales: 10.0,
            profit: 1.0,
            profit_margin: 10.0,
            orders: 1,
            avg_days: None,
        }];
        let table = Formatter::default().ship_mode_table("Ship Modes", &rows);
        assert_eq!(table.rows[0][4].text, "n/a");
        assert_eq!(table.rows[0][4].value, None);
    }
}
