//! Types for the print orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::printer::PrinterState;

/// Errors that end a poll loop early.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The cancellation token fired.
    #[error("cancelled")]
    Cancelled,

    /// Too many status fetches failed in a row.
    #[error("printer unreachable after {failures} consecutive failed polls")]
    PrinterUnreachable { failures: u32 },

    /// The printer never reported FINISHED within the completion timeout.
    #[error("print did not finish within {waited_secs}s")]
    Timeout { waited_secs: u64 },
}

/// Data collection loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    Collecting,
    Stopped,
}

/// Result of one data collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionOutcome {
    /// Records successfully written to the telemetry sink.
    pub entries_logged: usize,
    /// State that stopped collection (PAUSED or FINISHED).
    pub final_state: PrinterState,
}

/// Result of a completion wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOutcome {
    /// Status fetches performed, successful or not.
    pub polls: u32,
}

/// How a single job ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobOutcome {
    /// The printer reported FINISHED.
    Completed,
    /// Submission failed and the skip policy is active.
    Skipped { reason: String },
    /// Collection or waiting gave up. Halts the queue.
    Failed { reason: String },
    /// Shutdown requested. Halts the queue.
    Cancelled,
}

impl JobOutcome {
    /// Whether this outcome stops the remaining jobs from running.
    pub fn halts_queue(&self) -> bool {
        matches!(self, JobOutcome::Failed { .. } | JobOutcome::Cancelled)
    }
}

/// Report for one attempted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    pub file: String,
    /// Whether the printer accepted the start-print request.
    pub submitted: bool,
    pub telemetry_entries: usize,
    pub outcome: JobOutcome,
}

/// Summary of a whole queue run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of jobs in the queue.
    pub total_jobs: usize,
    /// Reports for the jobs that were attempted, in order.
    pub jobs: Vec<JobReport>,
}

impl RunSummary {
    pub fn completed(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| j.outcome == JobOutcome::Completed)
            .count()
    }

    /// True when a job failed or the run was cancelled.
    pub fn halted(&self) -> bool {
        self.jobs.iter().any(|j| j.outcome.halts_queue())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: JobOutcome) -> JobReport {
        JobReport {
            file: "cube.bgcode".to_string(),
            submitted: true,
            telemetry_entries: 4,
            outcome,
        }
    }

    #[test]
    fn test_error_display() {
        let err = OrchestratorError::PrinterUnreachable { failures: 5 };
        assert_eq!(
            err.to_string(),
            "printer unreachable after 5 consecutive failed polls"
        );
        let err = OrchestratorError::Timeout { waited_secs: 60 };
        assert_eq!(err.to_string(), "print did not finish within 60s");
    }

    #[test]
    fn test_run_summary_counts() {
        let summary = RunSummary {
            total_jobs: 3,
            jobs: vec![
                report(JobOutcome::Completed),
                report(JobOutcome::Skipped {
                    reason: "HTTP 409".to_string(),
                }),
                report(JobOutcome::Completed),
            ],
        };
        assert_eq!(summary.completed(), 2);
        assert!(!summary.halted());
    }

    #[test]
    fn test_failed_job_halts() {
        let summary = RunSummary {
            total_jobs: 2,
            jobs: vec![report(JobOutcome::Failed {
                reason: "timeout".to_string(),
            })],
        };
        assert!(summary.halted());
        assert!(JobOutcome::Cancelled.halts_queue());
    }

    #[test]
    fn test_job_outcome_serialization() {
        let json = serde_json::to_string(&JobOutcome::Skipped {
            reason: "busy".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"skipped","reason":"busy"}"#);
    }
}
