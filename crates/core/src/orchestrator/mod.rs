//! Print orchestrator.
//!
//! The orchestrator drives the job queue sequentially:
//! - **Submit**: one start-print request per job
//! - **Collect**: telemetry on every tick while PRINTING (`DataCollector`)
//! - **Wait**: poll until FINISHED (`CompletionWaiter`)
//!
//! Every loop observes a `CancellationToken`, backs off on failed polls, and can
//! be bounded by a failure limit or completion timeout.

mod backoff;
mod collector;
mod config;
mod runner;
mod types;
mod waiter;

pub use backoff::{next_delay, PollPolicy};
pub use collector::DataCollector;
pub use config::{OrchestratorConfig, SubmitFailurePolicy};
pub use runner::PrintOrchestrator;
pub use types::{
    CollectionOutcome, CollectorState, JobOutcome, JobReport, OrchestratorError, RunSummary,
    WaitOutcome,
};
pub use waiter::CompletionWaiter;
