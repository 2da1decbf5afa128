//! Orchestrator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::backoff::PollPolicy;

/// What to do with a job whose start-print request failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitFailurePolicy {
    /// Log the failure and still collect/wait for that job.
    #[default]
    Continue,
    /// Record the job as skipped and move to the next one.
    Skip,
}

/// Configuration for the print orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// How often to poll while collecting telemetry (milliseconds).
    #[serde(default = "default_collect_interval")]
    pub collect_interval_ms: u64,

    /// How often to poll while waiting for FINISHED (milliseconds).
    #[serde(default = "default_completion_interval")]
    pub completion_poll_interval_ms: u64,

    /// Give up waiting for FINISHED after this long.
    /// Unset means wait forever.
    #[serde(default)]
    pub completion_timeout_secs: Option<u64>,

    /// Abort a loop after this many failed status fetches in a row.
    /// Unset means retry forever.
    #[serde(default)]
    pub max_consecutive_failures: Option<u32>,

    /// Exponential backoff multiplier applied per consecutive failure.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Upper bound on the backoff delay (milliseconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,

    #[serde(default)]
    pub on_submit_failure: SubmitFailurePolicy,
}

fn default_collect_interval() -> u64 {
    5000 // 5 seconds
}

fn default_completion_interval() -> u64 {
    30_000 // 30 seconds
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_backoff() -> u64 {
    60_000 // 1 minute
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            collect_interval_ms: default_collect_interval(),
            completion_poll_interval_ms: default_completion_interval(),
            completion_timeout_secs: None,
            max_consecutive_failures: None,
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff_ms: default_max_backoff(),
            on_submit_failure: SubmitFailurePolicy::Continue,
        }
    }
}

impl OrchestratorConfig {
    /// Poll policy for the data collection loop.
    pub fn collect_policy(&self) -> PollPolicy {
        self.policy(self.collect_interval_ms)
    }

    /// Poll policy for the completion waiter.
    pub fn completion_policy(&self) -> PollPolicy {
        self.policy(self.completion_poll_interval_ms)
    }

    pub fn completion_timeout(&self) -> Option<Duration> {
        self.completion_timeout_secs.map(Duration::from_secs)
    }

    fn policy(&self, interval_ms: u64) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(interval_ms),
            multiplier: self.backoff_multiplier,
            max_delay: Duration::from_millis(self.max_backoff_ms),
            max_consecutive_failures: self.max_consecutive_failures,
        }
    }
}
