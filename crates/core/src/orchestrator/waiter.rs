//! Completion waiter: polls until the printer reports FINISHED.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::printer::{fetch_status, PrinterClient, PrinterState};

use super::backoff::{sleep_or_cancel, PollPolicy, PollTracker};
use super::types::{OrchestratorError, WaitOutcome};

/// Blocks a job until the printer reports FINISHED.
pub struct CompletionWaiter {
    client: Arc<dyn PrinterClient>,
    policy: PollPolicy,
    timeout: Option<Duration>,
}

impl CompletionWaiter {
    pub fn new(client: Arc<dyn PrinterClient>, policy: PollPolicy) -> Self {
        Self {
            client,
            policy,
            timeout: None,
        }
    }

    /// Fail with `OrchestratorError::Timeout` if FINISHED is not seen in time.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Block until the printer reports FINISHED.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<WaitOutcome, OrchestratorError> {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.poll_until_finished(cancel))
                .await
                .map_err(|_| OrchestratorError::Timeout {
                    waited_secs: timeout.as_secs(),
                })?,
            None => self.poll_until_finished(cancel).await,
        }
    }

    async fn poll_until_finished(
        &self,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome, OrchestratorError> {
        let mut tracker = PollTracker::new(self.policy.clone());
        let mut polls = 0u32;

        loop {
            let snapshot = tokio::select! {
                _ = cancel.cancelled() => return Err(OrchestratorError::Cancelled),
                snapshot = fetch_status(self.client.as_ref()) => snapshot,
            };
            polls += 1;

            match snapshot {
                Some(snapshot) if snapshot.state() == PrinterState::Finished => {
                    info!(polls, "Print completed");
                    return Ok(WaitOutcome { polls });
                }
                Some(snapshot) => {
                    tracker.record_success();
                    debug!(state = %snapshot.raw_state(), "Waiting for print to finish");
                }
                None => tracker.record_failure()?,
            }

            sleep_or_cancel(tracker.delay(), cancel).await?;
        }
    }
}
