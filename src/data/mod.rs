//! Data module - source loading, schema validation and snapshot caching

mod cache;
mod loader;
mod processor;
mod record;
mod schema;
mod sheets;

pub use cache::SnapshotCache;
pub use loader::{DataLoader, LoaderError, SnapshotSource};
pub use processor::{DataProcessor, ParseOptions, ProcessorError};
pub use record::{OrderRecord, OrderSnapshot};
pub use schema::{Capabilities, Field};
pub use sheets::{ServiceAccountKey, SheetsAuth, SheetsClient, SheetsError};
