//! Plain-text rendering of a dashboard for terminals.

use crate::charts::{ChartKind, ChartPlotter};
use crate::report::format::{Formatter, Table, Tone};
use crate::report::views::{Dashboard, View};

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

pub struct TextRenderer<'a> {
    formatter: &'a Formatter,
    color: bool,
}

impl<'a> TextRenderer<'a> {
    pub fn new(formatter: &'a Formatter, color: bool) -> Self {
        Self { formatter, color }
    }

    pub fn render(&self, dashboard: &Dashboard) -> String {
        let mut out = Vec::new();
        out.push(format!(
            "Source: {} | {} rows ({} dropped) | loaded {}",
            dashboard.source,
            dashboard.rows,
            dashboard.dropped_rows,
            dashboard.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"),
        ));
        for view in &dashboard.views {
            out.push(String::new());
            out.extend(self.render_view(view));
        }
        out.join("\n")
    }

    pub fn render_view(&self, view: &View) -> Vec<String> {
        let mut lines = vec![format!("== {} ==", view.title)];

        for warning in &view.warnings {
            lines.push(self.paint(&format!("! {}", warning), YELLOW));
        }

        if !view.kpis.is_empty() {
            let kpis: Vec<String> = view
                .kpis
                .iter()
                .map(|k| format!("{}: {}", k.label, k.display))
                .collect();
            lines.push(kpis.join("  |  "));
        }

        for chart in &view.charts {
            lines.push(String::new());
            let plotted = match chart.kind {
                ChartKind::Bar if chart.y_label.contains('%') => {
                    ChartPlotter::text_plot(chart, &|v| self.formatter.percent(v))
                }
                _ => ChartPlotter::text_plot(chart, &|v| self.formatter.currency(v)),
            };
            lines.extend(plotted);
        }

        for table in &view.tables {
            lines.push(String::new());
            lines.extend(self.render_table(table));
        }

        for note in &view.notes {
            lines.push(format!("- {}", note));
        }

        lines
    }

    /// Columns padded to their widest cell; numeric cells right-aligned.
    pub fn render_table(&self, table: &Table) -> Vec<String> {
        let mut lines = vec![format!("[{}]", table.title)];
        if table.rows.is_empty() {
            lines.push("  (no rows)".to_string());
            return lines;
        }

        let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
        for row in &table.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.text.chars().count());
                }
            }
        }

        let header: Vec<String> = table
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c, w = *w))
            .collect();
        lines.push(format!("  {}", header.join("  ")));
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        lines.push(format!("  {}", rule.join("  ")));

        for row in &table.rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| {
                    let padded = if cell.value.is_some() {
                        format!("{:>w$}", cell.text, w = *w)
                    } else {
                        format!("{:<w$}", cell.text, w = *w)
                    };
                    match cell.tone {
                        Tone::Negative => self.paint(&padded, RED),
                        Tone::Positive => self.paint(&padded, GREEN),
                        Tone::Neutral => padded,
                    }
                })
                .collect();
            lines.push(format!("  {}", cells.join("  ")));
        }
        lines
    }

    fn paint(&self, text: &str, color: &str) -> String {
        if self.color {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{OrderRecord, OrderSnapshot};
    use crate::report::views::{ViewBuilder, ViewKind};

    fn dashboard() -> Dashboard {
        let records = vec![
            OrderRecord {
                sales: 1500.0,
                profit: -300.0,
                region: Some("Central".into()),
                state: Some("Texas".into()),
                ..Default::default()
            },
            OrderRecord {
                sales: 200.0,
                profit: 50.0,
                region: Some("West".into()),
                state: Some("Utah".into()),
                ..Default::default()
            },
        ];
        let snapshot = OrderSnapshot::from_records(records);
        let formatter = Formatter::default();
        ViewBuilder::new(&snapshot, &formatter).build(&[ViewKind::Geography])
    }

    #[test]
    fn test_plain_render_aligns_numbers() {
        let formatter = Formatter::default();
        let text = TextRenderer::new(&formatter, false).render(&dashboard());

        assert!(text.contains("== Geographic Analysis =="));
        assert!(text.contains("[Region Performance]"));
        assert!(text.contains("$ 1,500.00"));
        assert!(!text.contains("\x1b["));

        let table_lines: Vec<&str> = text
            .lines()
            .skip_while(|l| !l.starts_with("[Loss-Making States]"))
            .collect();
        assert!(table_lines[1].trim_start().starts_with("State"));
        assert!(table_lines[3].contains("Texas"));
        assert!(table_lines[3].contains("-20.00%"));
    }

    #[test]
    fn test_color_render_marks_negative_profit() {
        let formatter = Formatter::default();
        let text = TextRenderer::new(&formatter, true).render(&dashboard());
        assert!(text.contains(&format!("{}$ -300.00{}", RED, RESET)));
    }

    #[test]
    fn test_empty_table_and_warnings() {
        let formatter = Formatter::default();
        let renderer = TextRenderer::new(&formatter, false);
        let mut view = dashboard().views.remove(0);
        view.warnings.push("Region performance skipped: missing column(s) Region".into());
        view.tables[1].rows.clear();

        let lines = renderer.render_view(&view);

        assert!(lines.contains(&"! Region performance skipped: missing column(s) Region".to_string()));
        assert!(lines.contains(&"  (no rows)".to_string()));
    }
}
