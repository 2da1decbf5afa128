//! Converter module for turning JSON documents into CSV.
//!
//! Accepts an array of records, a column-oriented object, a single object, or
//! JSON Lines (the telemetry log format). Nested objects are flattened into
//! separator-joined column names.
//!
//! # Example
//!
//! ```ignore
//! use printqueue_core::converter::convert_json_to_csv;
//!
//! let summary = convert_json_to_csv(Path::new("data.json"), Path::new("data.csv"))?;
//! println!("{} rows, {} columns", summary.rows, summary.columns.len());
//! ```

mod config;
mod error;
mod json_csv;
mod types;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use json_csv::{convert_json_to_csv, JsonCsvConverter};
pub use types::{ConversionSummary, InputLayout};
