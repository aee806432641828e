//! Chart Plotter Module
//! Chart descriptors handed to the rendering layer, plus a plain-text bar
//! plot for terminals.

use serde::Serialize;

/// Series colors
pub const SALES_COLOR: &str = "#1f77b4"; // Blue
pub const PROFIT_COLOR: &str = "#2ca02c"; // Green
pub const POSITIVE_COLOR: &str = "green";
pub const NEGATIVE_COLOR: &str = "red";

pub const PALETTE: [&str; 6] = [
    "#1f77b4", // Blue
    "#ff7f0e", // Orange
    "#2ca02c", // Green
    "#d62728", // Red
    "#9467bd", // Purple
    "#8c564b", // Brown
];

/// Hole size of donut charts, as a fraction of the radius.
pub const DONUT_HOLE: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    GroupedBar,
    HorizontalBar,
    Bar,
    Donut,
}

/// One named series of values, aligned with the chart categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Per-point colors, e.g. red for negative bars.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub point_colors: Vec<String>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
            color: None,
            point_colors: Vec::new(),
        }
    }

    pub fn colored(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    /// Green for non-negative points, red for negative ones.
    pub fn colored_by_sign(mut self) -> Self {
        self.point_colors = self
            .values
            .iter()
            .map(|v| if *v < 0.0 { NEGATIVE_COLOR } else { POSITIVE_COLOR }.to_string())
            .collect();
        self
    }
}

/// Everything the rendering layer needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub title: String,
    pub kind: ChartKind,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    /// Donut hole fraction; only set for donut charts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole: Option<f64>,
}

impl ChartData {
    pub fn new(title: impl Into<String>, kind: ChartKind, categories: Vec<String>) -> Self {
        Self {
            title: title.into(),
            kind,
            x_label: String::new(),
            y_label: String::new(),
            categories,
            series: Vec::new(),
            hole: (kind == ChartKind::Donut).then_some(DONUT_HOLE),
        }
    }

    pub fn with_axes(mut self, x_label: &str, y_label: &str) -> Self {
        self.x_label = x_label.to_string();
        self.y_label = y_label.to_string();
        self
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }
}

/// Draws chart descriptors as text.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Width of the longest bar in characters.
    pub const BAR_WIDTH: usize = 32;

    /// Get color for a series.
    pub fn get_series_color(index: usize) -> &'static str {
        PALETTE[index % PALETTE.len()]
    }

    /// Bar of `width * |value| / max_abs` blocks; negative values use a
    /// lighter shade.
    pub fn bar(value: f64, max_abs: f64, width: usize) -> String {
        if max_abs <= 0.0 || !value.is_finite() {
            return String::new();
        }
        let len = ((value.abs() / max_abs) * width as f64).round() as usize;
        let block = if value < 0.0 { "░" } else { "█" };
        block.repeat(len.min(width))
    }

    /// Share of each value in the total, as a percentage. Zero totals give
    /// zero shares.
    pub fn shares(values: &[f64]) -> Vec<f64> {
        let total: f64 = values.iter().sum();
        values
            .iter()
            .map(|v| if total == 0.0 { 0.0 } else { v / total * 100.0 })
            .collect()
    }

    /// Plot a chart as text lines, one per category and series.
    pub fn text_plot(chart: &ChartData, format_value: &dyn Fn(f64) -> String) -> Vec<String> {
        let mut lines = vec![format!("[{}]", chart.title)];
        if chart.categories.is_empty() {
            lines.push("  (no data)".to_string());
            return lines;
        }

        let label_width = chart
            .categories
            .iter()
            .map(|c| c.chars().count())
            .max()
            .unwrap_or(0);
        let series_width = chart
            .series
            .iter()
            .map(|s| s.name.chars().count())
            .max()
            .unwrap_or(0);
        let max_abs = chart
            .series
            .iter()
            .flat_map(|s| s.values.iter())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let multi = chart.series.len() > 1;

        for (i, category) in chart.categories.iter().enumerate() {
            for series in &chart.series {
                let Some(&value) = series.values.get(i) else {
                    continue;
                };
                let text = match chart.kind {
                    ChartKind::Donut => {
                        let share = Self::shares(&series.values)[i];
                        format!("{} ({:.1}%)", format_value(value), share)
                    }
                    _ => format_value(value),
                };
                let name = if multi {
                    format!(" {:<width$}", series.name, width = series_width)
                } else {
                    String::new()
                };
                lines.push(format!(
                    "  {:<lw$}{} |{:<bw$}| {}",
                    category,
                    name,
                    Self::bar(value, max_abs, Self::BAR_WIDTH),
                    text,
                    lw = label_width,
                    bw = Self::BAR_WIDTH,
                ));
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colored_by_sign() {
        let series = Series::new("Profit", vec![3.0, -1.0, 0.0]).colored_by_sign();
        assert_eq!(series.point_colors, vec!["green", "red", "green"]);
    }

    #[test]
    fn test_bar_scales_to_width() {
        assert_eq!(ChartPlotter::bar(10.0, 10.0, 4).chars().count(), 4);
        assert_eq!(ChartPlotter::bar(5.0, 10.0, 4), "██");
        assert_eq!(ChartPlotter::bar(-5.0, 10.0, 4), "░░");
        assert_eq!(ChartPlotter::bar(5.0, 0.0, 4), "");
    }

    #[test]
    fn test_shares_of_zero_total() {
        assert_eq!(ChartPlotter::shares(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert_eq!(ChartPlotter::shares(&[1.0, 3.0]), vec![25.0, 75.0]);
    }

    #[test]
    fn test_text_plot_lists_every_point() {
        let chart = ChartData::new(
            "Sales vs Profit",
            ChartKind::GroupedBar,
            vec!["East".to_string(), "West".to_string()],
        )
        .with_series(Series::new("Sales", vec![10.0, 20.0]).colored(SALES_COLOR))
        .with_series(Series::new("Profit", vec![-1.0, 2.0]).colored(PROFIT_COLOR));

        let lines = ChartPlotter::text_plot(&chart, &|v| format!("{:.1}", v));

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "[Sales vs Profit]");
        assert!(lines[2].contains("Profit") && lines[2].ends_with("-1.0"));
        assert!(lines[3].contains("West") && lines[3].ends_with("20.0"));
    }

    #[test]
    fn test_text_plot_donut_shows_shares() {
        let chart = ChartData::new(
            "Profit by Segment",
            ChartKind::Donut,
            vec!["Consumer".to_string(), "Corporate".to_string()],
        )
        .with_series(Series::new("Profit", vec![30.0, 10.0]));

        let lines = ChartPlotter::text_plot(&chart, &|v| format!("{:.0}", v));

        assert!(lines[1].ends_with("30 (75.0%)"));
        assert!(lines[2].ends_with("10 (25.0%)"));
    }
}
