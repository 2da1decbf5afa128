//! Poll scheduling with exponential backoff on consecutive failures.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::types::OrchestratorError;

/// Tunable parameters for a status poll loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay between polls while the printer answers.
    pub interval: Duration,
    /// Factor by which the delay grows after each failed poll.
    pub multiplier: f64,
    /// Upper bound on the backoff delay. Never below `interval`.
    pub max_delay: Duration,
    /// Give up after this many failures in a row (`None` = never).
    pub max_consecutive_failures: Option<u32>,
}

impl PollPolicy {
    /// Fixed interval, unbounded retries, no backoff growth.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            multiplier: 1.0,
            max_delay: interval,
            max_consecutive_failures: None,
        }
    }
}

/// Calculate the next backoff delay from the current delay and policy.
///
/// The result is clamped to `max(policy.max_delay, policy.interval)`.
pub fn next_delay(current: Duration, policy: &PollPolicy) -> Duration {
    let next_ms = (current.as_millis() as f64 * policy.multiplier) as u64;
    let ceiling = policy.max_delay.max(policy.interval);
    Duration::from_millis(next_ms).min(ceiling)
}

/// Tracks consecutive failures and the delay before the next poll.
#[derive(Debug)]
pub(crate) struct PollTracker {
    policy: PollPolicy,
    delay: Duration,
    failures: u32,
}

impl PollTracker {
    pub(crate) fn new(policy: PollPolicy) -> Self {
        let delay = policy.interval;
        Self {
            policy,
            delay,
            failures: 0,
        }
    }

    pub(crate) fn record_success(&mut self) {
        self.failures = 0;
        self.delay = self.policy.interval;
    }

    /// Count a failed poll. Errors once the failure limit is reached.
    pub(crate) fn record_failure(&mut self) -> Result<(), OrchestratorError> {
        self.failures += 1;
        if let Some(max) = self.policy.max_consecutive_failures {
            if self.failures >= max {
                return Err(OrchestratorError::PrinterUnreachable {
                    failures: self.failures,
                });
            }
        }
        self.delay = next_delay(self.delay, &self.policy);
        Ok(())
    }

    pub(crate) fn failures(&self) -> u32 {
        self.failures
    }

    pub(crate) fn delay(&self) -> Duration {
        self.delay
    }
}

/// Sleep for `delay` unless cancelled first.
pub(crate) async fn sleep_or_cancel(
    delay: Duration,
    cancel: &CancellationToken,
) -> Result<(), OrchestratorError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(OrchestratorError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
