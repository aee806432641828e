//! Data Processor Module
//! Coerces a raw string DataFrame into typed order records.

use crate::data::record::{OrderRecord, OrderSnapshot};
use crate::data::schema::{Capabilities, Field};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Required column '{0}' not found in source")]
    MissingRequiredColumn(Field),
}

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Parsing knobs coming from configuration.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Tried before the built-in date formats.
    pub date_format: Option<String>,
}

/// Handles schema validation and type coercion.
pub struct DataProcessor;

impl DataProcessor {
    /// Map known fields to the source column that carries them.
    ///
    /// When two headers resolve to the same field the first one wins.
    pub fn resolve_columns(df: &DataFrame) -> HashMap<Field, String> {
        let mut resolved = HashMap::new();
        for name in df.get_column_names() {
            let name = name.to_string();
            match Field::from_header(&name) {
                Some(field) if !resolved.contains_key(&field) => {
                    resolved.insert(field, name);
                }
                Some(field) => debug!(column = %name, %field, "Duplicate column ignored"),
                None => debug!(column = %name, "Unrecognised column ignored"),
            }
        }
        resolved
    }

    /// Validate the schema once and coerce every row.
    ///
    /// Rows whose sales or profit do not parse are dropped and counted.
    pub fn normalize(
        df: &DataFrame,
        options: &ParseOptions,
        source: &str,
    ) -> Result<OrderSnapshot, ProcessorError> {
        let resolved = Self::resolve_columns(df);
        for required in [Field::Sales, Field::Profit] {
            if !resolved.contains_key(&required) {
                return Err(ProcessorError::MissingRequiredColumn(required));
            }
        }

        let capabilities = Capabilities::new(resolved.keys().copied());
        for field in capabilities.missing(&Field::ALL) {
            if field != Field::ShippingCost {
                warn!(%field, "Column absent from source, dependent views will be skipped");
            }
        }

        let mut columns: HashMap<Field, Vec<Option<String>>> = HashMap::new();
        for (field, name) in &resolved {
            columns.insert(*field, Self::string_column(df, name)?);
        }

        let cell = |field: Field, row: usize| -> Option<&str> {
            columns
                .get(&field)
                .and_then(|values| values.get(row))
                .and_then(|value| value.as_deref())
        };
        let text = |field: Field, row: usize| -> Option<String> {
            cell(field, row)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        let number = |field: Field, row: usize| cell(field, row).and_then(Self::parse_number);
        let date = |field: Field, row: usize| {
            cell(field, row).and_then(|raw| Self::parse_date(raw, options.date_format.as_deref()))
        };

        let mut records = Vec::with_capacity(df.height());
        let mut dropped = 0usize;

        for row in 0..df.height() {
            let (Some(sales), Some(profit)) = (number(Field::Sales, row), number(Field::Profit, row))
            else {
                dropped += 1;
                continue;
            };

            records.push(OrderRecord {
                order_date: date(Field::OrderDate, row),
                ship_date: date(Field::ShipDate, row),
                ship_mode: text(Field::ShipMode, row),
                sales,
                profit,
                discount: number(Field::Discount, row),
                shipping_cost: number(Field::ShippingCost, row),
                category: text(Field::Category, row),
                sub_category: text(Field::SubCategory, row),
                region: text(Field::Region, row),
                state: text(Field::State, row),
                segment: text(Field::Segment, row),
            });
        }

        if dropped > 0 {
            warn!(dropped, "Rows without numeric sales or profit were excluded");
        }
        info!(rows = records.len(), source, "Orders normalized");

        Ok(OrderSnapshot::new(records, capabilities, dropped, source))
    }

    fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, ProcessorError> {
        let column = df.column(name)?.cast(&DataType::String)?;
        let values = column
            .str()?
            .into_iter()
            .map(|value| value.map(str::to_string))
            .collect();
        Ok(values)
    }

    /// Parse a numeric cell. Currency symbols are stripped and a trailing
    /// `%` divides by 100.
    ///
    /// Both `1,234.56` and `1.234,56` are accepted: the last separator is
    /// the decimal point and the other one must group digits by three. A
    /// lone comma that does not group by three (`1,5`) is a decimal comma.
    /// Anything else is rejected rather than guessed.
    pub fn parse_number(raw: &str) -> Option<f64> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix("R$").unwrap_or(trimmed);
        let (body, percent) = match trimmed.strip_suffix('%') {
            Some(body) => (body, true),
            None => (trimmed, false),
        };

        let cleaned: String = body
            .chars()
            .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | '_') && !c.is_whitespace())
            .collect();
        if cleaned.is_empty() {
            return None;
        }

        let value: f64 = Self::canonical_decimal(&cleaned)?.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(if percent { value / 100.0 } else { value })
    }

    /// Rewrite a number with either separator convention into `1234.56`.
    fn canonical_decimal(text: &str) -> Option<String> {
        let (sign, digits) = match text.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", text.strip_prefix('+').unwrap_or(text)),
        };

        let (int_part, frac_part, group_sep) = match (digits.rfind('.'), digits.rfind(',')) {
            (Some(dot), Some(comma)) if dot > comma => (&digits[..dot], Some(&digits[dot + 1..]), ','),
            (Some(_), Some(comma)) => (&digits[..comma], Some(&digits[comma + 1..]), '.'),
            (None, Some(comma)) => {
                if digits.matches(',').count() == 1 && !is_grouped(digits, ',') {
                    (&digits[..comma], Some(&digits[comma + 1..]), ',')
                } else {
                    (digits, None, ',')
                }
            }
            (Some(dot), None) => {
                if digits.matches('.').count() > 1 {
                    (digits, None, '.')
                } else {
                    (&digits[..dot], Some(&digits[dot + 1..]), '.')
                }
            }
            (None, None) => (digits, None, ','),
        };

        if int_part.contains(group_sep) && !is_grouped(int_part, group_sep) {
            return None;
        }
        let integer: String = int_part.chars().filter(|c| *c != group_sep).collect();
        if integer.contains(['.', ',']) {
            return None;
        }

        match frac_part {
            Some(frac) if frac.contains(['.', ',']) => None,
            Some(frac) => Some(format!("{}{}.{}", sign, integer, frac)),
            None => Some(format!("{}{}", sign, integer)),
        }
    }

    /// Parse a date cell, trying the preferred format first.
    pub fn parse_date(raw: &str, preferred: Option<&str>) -> Option<NaiveDate> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let date_formats = preferred.into_iter().chain(DATE_FORMATS);
        for format in date_formats {
            if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
                return Some(date);
            }
        }

        let datetime_formats = preferred.into_iter().chain(DATETIME_FORMATS);
        for format in datetime_formats {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(datetime.date());
            }
        }

        None
    }
}

/// `1,234,567` style: a leading group of one to three digits, then groups
/// of exactly three.
fn is_grouped(text: &str, separator: char) -> bool {
    let mut groups = text.split(separator);
    let leading_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()) && g.chars().all(|c| c.is_ascii_digit()));
    leading_ok && groups.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}
