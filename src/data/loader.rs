//! Orders Data Loader Module
//! Reads the configured source into a string DataFrame using Polars and
//! normalizes it into an order snapshot.

use crate::config::SourceConfig;
use crate::data::processor::{DataProcessor, ParseOptions, ProcessorError};
use crate::data::record::OrderSnapshot;
use crate::data::sheets::{SheetsAuth, SheetsClient, SheetsError};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Sample orders compiled into the binary for the `inline` source.
const SAMPLE_ORDERS: &str = include_str!("sample_orders.csv");

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to fetch spreadsheet: {0}")]
    Sheets(#[from] SheetsError),
    #[error("Malformed orders table: {0}")]
    Schema(#[from] ProcessorError),
}

/// Anything that can produce a fresh snapshot.
pub trait SnapshotSource {
    fn load(&self) -> Result<OrderSnapshot, LoaderError>;

    /// Short human-readable label for logs.
    fn describe(&self) -> String;
}

/// Loads orders from the configured source.
pub struct DataLoader {
    source: SourceConfig,
    options: ParseOptions,
}

impl DataLoader {
    pub fn new(source: SourceConfig, options: ParseOptions) -> Self {
        Self { source, options }
    }

    /// Read the raw table. Every column comes back as strings; coercion
    /// happens in the processor.
    pub fn load_frame(&self) -> Result<DataFrame, LoaderError> {
        match &self.source {
            SourceConfig::Inline => Self::read_csv_bytes(SAMPLE_ORDERS.as_bytes().to_vec()),
            SourceConfig::Csv { path } => Self::load_csv(path),
            SourceConfig::SheetExport {
                spreadsheet_id,
                gid,
                access_token,
            } => {
                let auth = SheetsAuth::resolve(access_token.as_deref(), None, None)?;
                let bytes = SheetsClient::new(auth)?.fetch_export_csv(spreadsheet_id, gid)?;
                Self::read_csv_bytes(bytes)
            }
            SourceConfig::SheetsApi {
                spreadsheet_id,
                range,
                access_token,
                service_account,
                credentials_path,
            } => {
                let auth = SheetsAuth::resolve(
                    access_token.as_deref(),
                    service_account.as_deref(),
                    credentials_path.as_deref(),
                )?;
                Ok(SheetsClient::new(auth)?.fetch_values(spreadsheet_id, range)?)
            }
        }
    }

    /// Load a CSV file using Polars.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        // Schema inference disabled so every column is read as a string
        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(0))
            .with_has_header(true)
            .finish()?
            .collect()?;
        Ok(df)
    }

    /// Parse CSV held in memory.
    pub fn read_csv_bytes(bytes: Vec<u8>) -> Result<DataFrame, LoaderError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        Ok(df)
    }
}

impl SnapshotSource for DataLoader {
    fn load(&self) -> Result<OrderSnapshot, LoaderError> {
        let label = self.describe();
        let df = self.load_frame()?;
        info!(
            source = %label,
            rows = df.height(),
            columns = df.width(),
            "Source loaded"
        );
        Ok(DataProcessor::normalize(&df, &self.options, &label)?)
    }

    fn describe(&self) -> String {
        match &self.source {
            SourceConfig::Inline => "inline sample".to_string(),
            SourceConfig::Csv { path } => format!("csv:{}", path.display()),
            SourceConfig::SheetExport {
                spreadsheet_id,
                gid,
                ..
            } => format!("sheet-export:{}#{}", spreadsheet_id, gid),
            SourceConfig::SheetsApi {
                spreadsheet_id,
                range,
                ..
            } => format!("sheets-api:{}!{}", spreadsheet_id, range),
        }
    }
}
