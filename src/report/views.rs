//! Report views.
//!
//! Builds the seven dashboard views from one snapshot. Each part of a view
//! checks the snapshot capabilities first; a part whose columns are absent
//! is skipped with a warning and everything else still renders.

use crate::charts::{ChartData, ChartKind, ChartPlotter, Series, PROFIT_COLOR, SALES_COLOR};
use crate::data::{Field, OrderSnapshot};
use crate::report::format::{Formatter, Table};
use crate::stats::{
    aggregate, discount_impact, loss_states, loss_subcategories, sort_by_profit_ascending,
    yearly_performance, AggregateRow, Dimension, StatsCalculator, Totals,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use tracing::warn;

/// Built-in strategic recommendations.
pub const DEFAULT_RECOMMENDATIONS: [&str; 6] = [
    "Focus on profitability, not just sales: prioritise strategies that raise profit margin. \
     Review pricing, costs and discount policy for problem items and areas.",
    "Manage discounts strategically: avoid blanket aggressive discounts and favour targeted \
     promotions that do not erode margin.",
    "Optimise by geography: investigate the causes of weak results in specific regions and \
     states, and adapt marketing and sales strategy regionally.",
    "Understand and engage customer segments: build personas for each segment and tailor \
     marketing, communication and product offering.",
    "Improve logistics and shipping efficiency: monitor shipping times continuously and \
     streamline processes to cut lead times and costs.",
    "Monitor continuously: keep dashboards and regular reports in place to track the KPIs \
     identified here.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Overview,
    Products,
    Geography,
    Customers,
    Discounts,
    Shipping,
    Recommendations,
}

impl ViewKind {
    pub const ALL: [ViewKind; 7] = [
        ViewKind::Overview,
        ViewKind::Products,
        ViewKind::Geography,
        ViewKind::Customers,
        ViewKind::Discounts,
        ViewKind::Shipping,
        ViewKind::Recommendations,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ViewKind::Overview => "Performance Overview",
            ViewKind::Products => "Product Performance",
            ViewKind::Geography => "Geographic Analysis",
            ViewKind::Customers => "Customer Analysis",
            ViewKind::Discounts => "Discount Impact",
            ViewKind::Shipping => "Shipping Logistics",
            ViewKind::Recommendations => "Conclusions & Recommendations",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub label: String,
    pub value: f64,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub kind: ViewKind,
    pub title: String,
    pub kpis: Vec<Kpi>,
    pub charts: Vec<ChartData>,
    pub tables: Vec<Table>,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
}

impl View {
    fn new(kind: ViewKind) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            kpis: Vec::new(),
            charts: Vec::new(),
            tables: Vec::new(),
            notes: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn kpi(&mut self, label: &str, value: f64, display: String) {
        self.kpis.push(Kpi {
            label: label.to_string(),
            value,
            display,
        });
    }

    fn skip(&mut self, message: String) {
        warn!(view = ?self.kind, "{}", message);
        self.warnings.push(message);
    }
}

/// All views of one render pass.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub rows: usize,
    pub dropped_rows: usize,
    pub views: Vec<View>,
}

impl Dashboard {
    pub fn view(&self, kind: ViewKind) -> Option<&View> {
        self.views.iter().find(|v| v.kind == kind)
    }

    pub fn write_json<W: Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(writer, self)
    }
}

/// Builds views from a snapshot.
pub struct ViewBuilder<'a> {
    snapshot: &'a OrderSnapshot,
    formatter: &'a Formatter,
    recommendations: Vec<String>,
}

impl<'a> ViewBuilder<'a> {
    pub fn new(snapshot: &'a OrderSnapshot, formatter: &'a Formatter) -> Self {
        Self {
            snapshot,
            formatter,
            recommendations: DEFAULT_RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn with_recommendations(mut self, recommendations: Vec<String>) -> Self {
        self.recommendations = recommendations;
        self
    }

    /// Build the requested views, or all seven when `only` is empty.
    pub fn build(&self, only: &[ViewKind]) -> Dashboard {
        let kinds: Vec<ViewKind> = if only.is_empty() {
            ViewKind::ALL.to_vec()
        } else {
            ViewKind::ALL
                .into_iter()
                .filter(|k| only.contains(k))
                .collect()
        };

        Dashboard {
            source: self.snapshot.source().to_string(),
            loaded_at: self.snapshot.loaded_at(),
            rows: self.snapshot.len(),
            dropped_rows: self.snapshot.dropped_rows(),
            views: kinds.into_iter().map(|k| self.build_view(k)).collect(),
        }
    }

    pub fn build_view(&self, kind: ViewKind) -> View {
        let mut view = View::new(kind);
        match kind {
            ViewKind::Overview => self.overview(&mut view),
            ViewKind::Products => self.products(&mut view),
            ViewKind::Geography => self.geography(&mut view),
            ViewKind::Customers => self.customers(&mut view),
            ViewKind::Discounts => self.discounts(&mut view),
            ViewKind::Shipping => self.shipping(&mut view),
            ViewKind::Recommendations => view.notes = self.recommendations.clone(),
        }
        view
    }

    /// True when every field is available; otherwise records why `part`
    /// was skipped.
    fn require(&self, view: &mut View, part: &str, fields: &[Field]) -> bool {
        let missing = self.snapshot.capabilities().missing(fields);
        if missing.is_empty() {
            return true;
        }
        let names: Vec<&str> = missing.iter().map(|f| f.column_name()).collect();
        view.skip(format!(
            "{} skipped: missing column(s) {}",
            part,
            names.join(", ")
        ));
        false
    }

    fn overview(&self, view: &mut View) {
        let records = self.snapshot.records();
        let fmt = self.formatter;
        let totals = Totals::of(records);

        view.kpi("Total Sales", totals.sales, fmt.currency(totals.sales));
        view.kpi("Total Profit", totals.profit, fmt.currency(totals.profit));
        view.kpi("Overall Profit Margin", totals.margin(), fmt.percent(totals.margin()));

        if !self.require(view, "Yearly performance", &[Field::OrderDate]) {
            return;
        }
        let years = yearly_performance(records);
        if years.is_empty() {
            view.skip("Yearly performance skipped: no parseable order dates".to_string());
            return;
        }
        let chart = ChartData::new(
            "Sales and Profit by Year",
            ChartKind::Line,
            years.iter().map(|y| y.year.to_string()).collect(),
        )
        .with_axes("Year", "Amount")
        .with_series(
            Series::new("Sales", years.iter().map(|y| y.sales).collect()).colored(SALES_COLOR),
        )
        .with_series(
            Series::new("Profit", years.iter().map(|y| y.profit).collect()).colored(PROFIT_COLOR),
        );
        view.charts.push(chart);
    }

    fn products(&self, view: &mut View) {
        let records = self.snapshot.records();
        let fmt = self.formatter;

        if self.require(view, "Category performance", &[Field::Category]) {
            let rows = aggregate(records, Dimension::Category);
            view.charts.push(sales_vs_profit_chart(
                "Sales vs Profit by Category",
                "Category",
                &rows,
            ));
            view.tables
                .push(fmt.aggregate_table("Category Performance", "Category", &rows));
        }

        if self.require(view, "Sub-category profit", &[Field::SubCategory]) {
            let mut rows = aggregate(records, Dimension::SubCategory);
            sort_by_profit_ascending(&mut rows);
            view.charts.push(
                ChartData::new(
                    "Profit by Sub-Category",
                    ChartKind::HorizontalBar,
                    rows.iter().map(|r| r.key.clone()).collect(),
                )
                .with_axes("Profit", "Sub-Category")
                .with_series(
                    Series::new("Profit", rows.iter().map(|r| r.profit).collect())
                        .colored_by_sign(),
                ),
            );
        }

        if self.require(
            view,
            "Loss-making sub-categories",
            &[Field::Category, Field::SubCategory],
        ) {
            let rows = loss_subcategories(records);
            view.tables.push(fmt.pair_table(
                "Loss-Making Sub-Categories",
                ("Category", "Sub-Category"),
                &rows,
            ));
        }
    }

    fn geography(&self, view: &mut View) {
        let records = self.snapshot.records();
        let fmt = self.formatter;

        if self.require(view, "Region performance", &[Field::Region]) {
            let rows = aggregate(records, Dimension::Region);
            view.charts.push(sales_vs_profit_chart(
                "Sales vs Profit by Region",
                "Region",
                &rows,
            ));
            view.tables
                .push(fmt.aggregate_table("Region Performance", "Region", &rows));
        }

        if self.require(view, "Loss-making states", &[Field::State]) {
            let rows = loss_states(records);
            view.tables
                .push(fmt.aggregate_table("Loss-Making States", "State", &rows));
        }
    }

    fn customers(&self, view: &mut View) {
        if !self.require(view, "Segment performance", &[Field::Segment]) {
            return;
        }
        let rows = aggregate(self.snapshot.records(), Dimension::Segment);

        let mut profit = Series::new("Profit", rows.iter().map(|r| r.profit).collect());
        profit.point_colors = (0..rows.len())
            .map(|i| ChartPlotter::get_series_color(i).to_string())
            .collect();
        view.charts.push(
            ChartData::new(
                "Profit Share by Segment",
                ChartKind::Donut,
                rows.iter().map(|r| r.key.clone()).collect(),
            )
            .with_series(profit),
        );
        view.tables.push(self.formatter.aggregate_table(
            "Segment Performance",
            "Segment",
            &rows,
        ));
    }

    fn discounts(&self, view: &mut View) {
        let records = self.snapshot.records();

        if self.require(view, "Discount impact", &[Field::Discount]) {
            let buckets = discount_impact(records);
            if buckets.iter().all(|b| b.orders == 0) {
                view.skip("Discount impact skipped: no rows with a discount in [0, 1]".to_string());
            } else {
                view.charts.push(
                    ChartData::new(
                        "Profit Margin by Discount Range",
                        ChartKind::Bar,
                        buckets.iter().map(|b| b.label.clone()).collect(),
                    )
                    .with_axes("Discount Range", "Profit Margin (%)")
                    .with_series(
                        Series::new(
                            "Profit Margin",
                            buckets.iter().map(|b| b.profit_margin).collect(),
                        )
                        .colored_by_sign(),
                    ),
                );
            }
        }

        if self.require(view, "Correlation matrix", &[Field::Discount]) {
            match StatsCalculator::correlation_matrix(records) {
                Some(matrix) => view
                    .tables
                    .push(self.formatter.correlation_table("Correlation Matrix", &matrix)),
                None => view.skip(
                    "Correlation matrix skipped: fewer than 2 rows with sales, profit and discount"
                        .to_string(),
                ),
            }
        }
    }

    fn shipping(&self, view: &mut View) {
        let fmt = self.formatter;
        let report = StatsCalculator::shipping_performance(self.snapshot.records());

        if self.require(
            view,
            "Shipping time KPIs",
            &[Field::OrderDate, Field::ShipDate],
        ) {
            match report.overall {
                Some(stats) => {
                    view.kpi("Average Shipping Time", stats.mean, fmt.days(stats.mean));
                    view.kpi("Median Shipping Time", stats.median, fmt.days(stats.median));
                }
                None => view.skip(
                    "Shipping time KPIs skipped: no rows with both order and ship dates"
                        .to_string(),
                ),
            }
        }

        if self.require(view, "Ship-mode performance", &[Field::ShipMode]) {
            view.tables
                .push(fmt.ship_mode_table("Ship-Mode Performance", &report.modes));
        }
    }
}

fn sales_vs_profit_chart(title: &str, axis: &str, rows: &[AggregateRow]) -> ChartData {
    ChartData::new(
        title,
        ChartKind::GroupedBar,
        rows.iter().map(|r| r.key.clone()).collect(),
    )
    .with_axes(axis, "Amount")
    .with_series(Series::new("Sales", rows.iter().map(|r| r.sales).collect()).colored(SALES_COLOR))
    .with_series(
        Series::new("Profit", rows.iter().map(|r| r.profit).collect()).colored(PROFIT_COLOR),
    )
}
