//! Telemetry logging.
//!
//! Status snapshots are stamped with a local timestamp and appended to a
//! `TelemetrySink`, by default a JSON Lines file.

mod jsonl;
mod types;

pub use jsonl::JsonlTelemetryLog;
pub use types::*;
