//! Types for printer client operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur while talking to a printer.
#[derive(Debug, Error)]
pub enum PrinterError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The printer answered, but not with 200.
    #[error("Request rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

/// Printer state as reported in `printer.state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrinterState {
    Idle,
    Busy,
    Printing,
    Paused,
    Finished,
    Stopped,
    Error,
    Attention,
    Ready,
    /// Anything the printer reports that we do not recognise.
    Unknown,
}

impl PrinterState {
    /// Parse the wire representation. Unrecognised values map to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s {
            "IDLE" => PrinterState::Idle,
            "BUSY" => PrinterState::Busy,
            "PRINTING" => PrinterState::Printing,
            "PAUSED" => PrinterState::Paused,
            "FINISHED" => PrinterState::Finished,
            "STOPPED" => PrinterState::Stopped,
            "ERROR" => PrinterState::Error,
            "ATTENTION" => PrinterState::Attention,
            "READY" => PrinterState::Ready,
            _ => PrinterState::Unknown,
        }
    }

    /// Returns the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrinterState::Idle => "IDLE",
            PrinterState::Busy => "BUSY",
            PrinterState::Printing => "PRINTING",
            PrinterState::Paused => "PAUSED",
            PrinterState::Finished => "FINISHED",
            PrinterState::Stopped => "STOPPED",
            PrinterState::Error => "ERROR",
            PrinterState::Attention => "ATTENTION",
            PrinterState::Ready => "READY",
            PrinterState::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for PrinterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fetched status document.
///
/// The whole document is kept so telemetry records every field the
/// printer reports, not just the state.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    document: Map<String, Value>,
    state: PrinterState,
}

impl StatusSnapshot {
    /// Build a snapshot from a decoded status document.
    ///
    /// The document must be an object with a string at `printer.state`.
    pub fn from_value(value: Value) -> Result<Self, PrinterError> {
        let Value::Object(document) = value else {
            return Err(PrinterError::InvalidResponse(
                "status document is not a JSON object".to_string(),
            ));
        };

        let state = document
            .get("printer")
            .and_then(|p| p.get("state"))
            .and_then(Value::as_str)
            .map(PrinterState::parse)
            .ok_or_else(|| {
                PrinterError::InvalidResponse("missing printer.state".to_string())
            })?;

        Ok(Self { document, state })
    }

    pub fn state(&self) -> PrinterState {
        self.state
    }

    /// The state string exactly as the printer sent it.
    pub fn raw_state(&self) -> &str {
        self.document
            .get("printer")
            .and_then(|p| p.get("state"))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    pub fn into_document(self) -> Map<String, Value> {
        self.document
    }
}

/// Trait for printer backends.
#[async_trait]
pub trait PrinterClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Fetch the current status document.
    async fn status(&self) -> Result<StatusSnapshot, PrinterError>;

    /// Ask the printer to start printing a file from its storage.
    async fn start_print(&self, file: &str) -> Result<(), PrinterError>;
}

/// Fetch a status snapshot, logging and swallowing any failure.
pub async fn fetch_status(client: &dyn PrinterClient) -> Option<StatusSnapshot> {
    match client.status().await {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!(printer = client.name(), error = %e, "Failed to fetch printer status");
            None
        }
    }
}
