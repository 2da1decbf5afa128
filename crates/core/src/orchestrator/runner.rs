//! Print orchestrator implementation.
//!
//! Runs the queue one job at a time:
//! - Submit: start-print request (failure handled per `SubmitFailurePolicy`)
//! - Collect: telemetry until PAUSED or FINISHED
//! - Wait: poll until FINISHED (skipped when collection already saw it)

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::printer::{PrinterClient, PrinterState};
use crate::telemetry::TelemetrySink;

use super::collector::DataCollector;
use super::config::{OrchestratorConfig, SubmitFailurePolicy};
use super::types::{JobOutcome, JobReport, OrchestratorError, RunSummary};
use super::waiter::CompletionWaiter;

/// The print orchestrator - drives the job queue against one printer.
pub struct PrintOrchestrator {
    config: OrchestratorConfig,
    jobs: Vec<String>,
    client: Arc<dyn PrinterClient>,
    collector: DataCollector,
    waiter: CompletionWaiter,
}

impl PrintOrchestrator {
    /// Create a new orchestrator for the given queue.
    pub fn new(
        config: OrchestratorConfig,
        jobs: Vec<String>,
        client: Arc<dyn PrinterClient>,
        sink: Arc<dyn TelemetrySink>,
    ) -> Self {
        let collector =
            DataCollector::new(Arc::clone(&client), sink, config.collect_policy());
        let waiter = CompletionWaiter::new(Arc::clone(&client), config.completion_policy())
            .with_timeout(config.completion_timeout());

        Self {
            config,
            jobs,
            client,
            collector,
            waiter,
        }
    }

    pub fn jobs(&self) -> &[String] {
        &self.jobs
    }

    /// Run every job in order. Stops early on a failed or cancelled job.
    pub async fn run(&self, cancel: &CancellationToken) -> RunSummary {
        let total = self.jobs.len();
        let mut summary = RunSummary {
            total_jobs: total,
            jobs: Vec::with_capacity(total),
        };

        for (i, file) in self.jobs.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Cancellation requested, not starting remaining jobs");
                break;
            }

            info!("Starting job {}/{}: {}", i + 1, total, file);
            let report = self.run_job(file, cancel).await;

            match &report.outcome {
                JobOutcome::Completed => info!("Print {}/{} completed", i + 1, total),
                JobOutcome::Skipped { reason } => {
                    warn!("Print {}/{} skipped: {}", i + 1, total, reason)
                }
                JobOutcome::Failed { reason } => {
                    error!("Print {}/{} failed, halting queue: {}", i + 1, total, reason)
                }
                JobOutcome::Cancelled => warn!("Print {}/{} cancelled", i + 1, total),
            }

            let halt = report.outcome.halts_queue();
            summary.jobs.push(report);
            if halt {
                break;
            }
        }

        info!(
            "Queue finished: {}/{} prints completed",
            summary.completed(),
            total
        );
        summary
    }

    async fn run_job(&self, file: &str, cancel: &CancellationToken) -> JobReport {
        let submit = tokio::select! {
            _ = cancel.cancelled() => {
                return JobReport {
                    file: file.to_string(),
                    submitted: false,
                    telemetry_entries: 0,
                    outcome: JobOutcome::Cancelled,
                };
            }
            result = self.client.start_print(file) => result,
        };

        let submitted = match submit {
            Ok(()) => {
                info!("Started print: {}", file);
                true
            }
            Err(e) => {
                error!("Failed to start print: {}, error: {}", file, e);
                if self.config.on_submit_failure == SubmitFailurePolicy::Skip {
                    return JobReport {
                        file: file.to_string(),
                        submitted: false,
                        telemetry_entries: 0,
                        outcome: JobOutcome::Skipped {
                            reason: e.to_string(),
                        },
                    };
                }
                false
            }
        };

        let (telemetry_entries, result) = self.follow_print(cancel).await;
        let outcome = match result {
            Ok(()) => JobOutcome::Completed,
            Err(OrchestratorError::Cancelled) => JobOutcome::Cancelled,
            Err(e) => JobOutcome::Failed {
                reason: e.to_string(),
            },
        };

        JobReport {
            file: file.to_string(),
            submitted,
            telemetry_entries,
            outcome,
        }
    }

    /// Collect telemetry, then wait for FINISHED unless collection already saw it.
    async fn follow_print(&self, cancel: &CancellationToken) -> (usize, Result<(), OrchestratorError>) {
        let collected = match self.collector.run_counted(cancel).await {
            (_, Ok(outcome)) => outcome,
            (entries_logged, Err(e)) => return (entries_logged, Err(e)),
        };

        if collected.final_state == PrinterState::Finished {
            return (collected.entries_logged, Ok(()));
        }

        info!(
            state = %collected.final_state,
            "Collection stopped before FINISHED, waiting for completion"
        );
        let waited = self.waiter.wait(cancel).await.map(|_| ());
        (collected.entries_logged, waited)
    }
}
