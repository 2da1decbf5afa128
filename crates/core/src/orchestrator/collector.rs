//! Data collection loop.
//!
//! Logs a telemetry record on every tick while the printer is PRINTING, logs
//! once more and stops when it reports PAUSED or FINISHED.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::printer::{fetch_status, PrinterClient, PrinterState, StatusSnapshot};
use crate::telemetry::{TelemetryRecord, TelemetrySink};

use super::backoff::{sleep_or_cancel, PollPolicy, PollTracker};
use super::types::{CollectionOutcome, CollectorState, OrchestratorError};

/// What a tick does with a fetched snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickAction {
    /// Log and keep collecting.
    Log,
    /// Log once and stop.
    LogAndStop,
    /// Neither log nor stop.
    Ignore,
}

fn classify(state: PrinterState) -> TickAction {
    match state {
        PrinterState::Printing => TickAction::Log,
        PrinterState::Paused | PrinterState::Finished => TickAction::LogAndStop,
        _ => TickAction::Ignore,
    }
}

/// Collects telemetry for the job currently printing.
pub struct DataCollector {
    client: Arc<dyn PrinterClient>,
    sink: Arc<dyn TelemetrySink>,
    policy: PollPolicy,
}

impl DataCollector {
    pub fn new(
        client: Arc<dyn PrinterClient>,
        sink: Arc<dyn TelemetrySink>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            client,
            sink,
            policy,
        }
    }

    /// Run until the printer reports PAUSED or FINISHED.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
    ) -> Result<CollectionOutcome, OrchestratorError> {
        self.run_counted(cancel).await.1
    }

    /// Like [`run`](Self::run), but also returns the number of records written
    /// when collection ends with an error.
    pub async fn run_counted(
        &self,
        cancel: &CancellationToken,
    ) -> (usize, Result<CollectionOutcome, OrchestratorError>) {
        let mut entries_logged = 0;
        let result = self.collect(cancel, &mut entries_logged).await;
        (entries_logged, result)
    }

    async fn collect(
        &self,
        cancel: &CancellationToken,
        entries_logged: &mut usize,
    ) -> Result<CollectionOutcome, OrchestratorError> {
        info!("Starting data collection");

        let mut tracker = PollTracker::new(self.policy.clone());
        let mut state = CollectorState::Collecting;

        loop {
            let snapshot = tokio::select! {
                _ = cancel.cancelled() => return Err(OrchestratorError::Cancelled),
                snapshot = fetch_status(self.client.as_ref()) => snapshot,
            };

            match snapshot {
                Some(snapshot) => {
                    tracker.record_success();
                    let printer_state = snapshot.state();

                    match classify(printer_state) {
                        TickAction::Ignore => {
                            debug!(state = %snapshot.raw_state(), "Printer not printing, not logging");
                        }
                        action => {
                            if self.log(&snapshot).await {
                                *entries_logged += 1;
                            }
                            if action == TickAction::LogAndStop {
                                state = CollectorState::Stopped;
                            }
                        }
                    }

                    if state == CollectorState::Stopped {
                        info!(
                            state = %printer_state,
                            entries_logged = *entries_logged,
                            "Print stopped, ending data collection"
                        );
                        return Ok(CollectionOutcome {
                            entries_logged: *entries_logged,
                            final_state: printer_state,
                        });
                    }
                }
                None => {
                    tracker.record_failure()?;
                    debug!(
                        failures = tracker.failures(),
                        delay_ms = tracker.delay().as_millis() as u64,
                        "No status snapshot, backing off"
                    );
                }
            }

            sleep_or_cancel(tracker.delay(), cancel).await?;
        }
    }

    /// Stamp and append a snapshot. Write failures are logged, not fatal.
    async fn log(&self, snapshot: &StatusSnapshot) -> bool {
        let record = TelemetryRecord::now(snapshot);
        match self.sink.append(&record).await {
            Ok(()) => {
                debug!(state = %snapshot.raw_state(), "Telemetry logged");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to write telemetry record");
                false
            }
        }
    }
}
