//! Append-only JSON Lines telemetry log.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{TelemetryError, TelemetryRecord, TelemetrySink};

/// Writes one JSON object per line, creating the file on first use.
#[derive(Debug, Clone)]
pub struct JsonlTelemetryLog {
    path: PathBuf,
}

impl JsonlTelemetryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TelemetrySink for JsonlTelemetryLog {
    async fn append(&self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
        let mut line = record.to_line()?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(path = %self.path.display(), "Telemetry record appended");
        Ok(())
    }
}
