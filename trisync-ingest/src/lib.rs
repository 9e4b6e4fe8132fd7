//! trisync-ingest: raw bank record shapes and their normalization into canonical transactions.

pub mod error;
pub mod normalize;
pub mod parsers;
pub mod types;

pub use error::IngestError;
pub use normalize::Normalize;
pub use parsers::csv_export::{parse_export, read_export};
pub use types::{DetailField, RawCsvRow, RawDetailRecord};
