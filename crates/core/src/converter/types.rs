//! Types for the converter module.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Data rows written (excluding the header).
    pub rows: usize,
    /// Header, in column order.
    pub columns: Vec<String>,
}

/// Layout the input document was read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputLayout {
    /// `[{...}, {...}]`
    Records,
    /// `{"col": [...], ...}`
    Columns,
    /// A single `{...}` treated as one row.
    SingleRecord,
    /// One object per line.
    JsonLines,
}
