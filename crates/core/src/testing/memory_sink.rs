//! In-memory telemetry sink for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::telemetry::{TelemetryError, TelemetryRecord, TelemetrySink};

/// Collects records in memory; can be told to fail writes.
#[derive(Debug, Default, Clone)]
pub struct MemoryTelemetrySink {
    records: Arc<RwLock<Vec<TelemetryRecord>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent append fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn records(&self) -> Vec<TelemetryRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// States of the stored records, in append order.
    pub async fn states(&self) -> Vec<String> {
        self.records
            .read()
            .await
            .iter()
            .filter_map(|r| r.fields().get("printer")?.get("state")?.as_str().map(String::from))
            .collect()
    }
}

#[async_trait]
impl TelemetrySink for MemoryTelemetrySink {
    async fn append(&self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TelemetryError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "mock sink configured to fail",
            )));
        }
        self.records.write().await.push(record.clone());
        Ok(())
    }
}
