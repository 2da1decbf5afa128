//! Types for telemetry logging.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::printer::StatusSnapshot;

/// Timestamp format stamped onto every record.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Name of the field the timestamp is written to.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Errors that can occur while writing telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A status snapshot with its capture time.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    fields: Map<String, Value>,
}

impl TelemetryRecord {
    /// Stamp a snapshot with the given local time.
    ///
    /// An existing top-level `timestamp` key is overwritten.
    pub fn stamp(snapshot: &StatusSnapshot, at: NaiveDateTime) -> Self {
        let mut fields = snapshot.document().clone();
        fields.insert(
            TIMESTAMP_FIELD.to_string(),
            Value::String(at.format(TIMESTAMP_FORMAT).to_string()),
        );
        Self { fields }
    }

    /// Stamp a snapshot with the current local time.
    pub fn now(snapshot: &StatusSnapshot) -> Self {
        Self::stamp(snapshot, Local::now().naive_local())
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.fields.get(TIMESTAMP_FIELD).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Serialize as one JSON line (without the trailing newline).
    pub fn to_line(&self) -> Result<String, TelemetryError> {
        Ok(serde_json::to_string(&self.fields)?)
    }
}

/// Destination for telemetry records.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Append one record.
    async fn append(&self, record: &TelemetryRecord) -> Result<(), TelemetryError>;
}
