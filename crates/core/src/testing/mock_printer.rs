//! Mock printer for testing.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::printer::{PrinterClient, PrinterError, StatusSnapshot};

use super::fixtures;

/// A recorded start-print request for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSubmission {
    /// File that was requested.
    pub file: String,
    /// Whether the mock accepted it.
    pub accepted: bool,
    /// When the request was made.
    pub timestamp: chrono::DateTime<Utc>,
}

/// One scripted answer to a status request.
#[derive(Debug, Clone)]
enum ScriptedStatus {
    Document(Value),
    Failure(String),
}

/// Mock implementation of the PrinterClient trait.
///
/// Provides controllable behavior for testing:
/// - Scripted status responses, consumed in order
/// - The last scripted response repeats once the script runs out
/// - Recorded start-print requests
/// - Simulated submit rejections
///
/// # Example
///
/// ```rust,ignore
/// let printer = MockPrinter::with_states(&["PRINTING", "PRINTING", "FINISHED"]);
///
/// printer.start_print("cube.bgcode").await?;
/// assert_eq!(printer.status().await?.state(), PrinterState::Printing);
///
/// let submitted = printer.submissions().await;
/// assert_eq!(submitted[0].file, "cube.bgcode");
/// ```
#[derive(Debug, Default)]
pub struct MockPrinter {
    /// Status answers still to be served.
    script: Arc<RwLock<VecDeque<ScriptedStatus>>>,
    /// Recorded start_print calls.
    submissions: Arc<RwLock<Vec<RecordedSubmission>>>,
    /// If set, start_print is rejected with (status, body).
    submit_rejection: Arc<RwLock<Option<(u16, String)>>>,
    /// Number of status calls served.
    status_calls: AtomicUsize,
}

impl MockPrinter {
    /// Create a mock with an empty script. Status calls fail until scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that reports the given states in order.
    pub fn with_states(states: &[&str]) -> Self {
        let script = states
            .iter()
            .map(|s| ScriptedStatus::Document(fixtures::status_document(s)))
            .collect();
        Self {
            script: Arc::new(RwLock::new(script)),
            ..Self::default()
        }
    }

    /// Append a state to the script.
    pub async fn push_state(&self, state: &str) {
        self.push_document(fixtures::status_document(state)).await;
    }

    /// Append a raw status document to the script.
    pub async fn push_document(&self, document: Value) {
        self.script
            .write()
            .await
            .push_back(ScriptedStatus::Document(document));
    }

    /// Append a failed status fetch to the script.
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.script
            .write()
            .await
            .push_back(ScriptedStatus::Failure(message.into()));
    }

    /// Reject subsequent start_print calls with the given HTTP status and body.
    pub async fn reject_submissions(&self, status: u16, body: impl Into<String>) {
        *self.submit_rejection.write().await = Some((status, body.into()));
    }

    /// Accept subsequent start_print calls again.
    pub async fn accept_submissions(&self) {
        *self.submit_rejection.write().await = None;
    }

    /// Get all recorded start_print calls.
    pub async fn submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.read().await.clone()
    }

    /// Number of status requests served so far.
    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// Scripted answers not yet consumed.
    pub async fn remaining(&self) -> usize {
        self.script.read().await.len()
    }

    /// Pop the next answer, repeating the last one once the script is exhausted.
    async fn next_status(&self) -> Option<ScriptedStatus> {
        let mut script = self.script.write().await;
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }
}

#[async_trait]
impl PrinterClient for MockPrinter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn status(&self) -> Result<StatusSnapshot, PrinterError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match self.next_status().await {
            Some(ScriptedStatus::Document(doc)) => StatusSnapshot::from_value(doc),
            Some(ScriptedStatus::Failure(message)) => Err(PrinterError::ConnectionFailed(message)),
            None => Err(PrinterError::ConnectionFailed(
                "mock printer has no scripted status".to_string(),
            )),
        }
    }

    async fn start_print(&self, file: &str) -> Result<(), PrinterError> {
        let rejection = self.submit_rejection.read().await.clone();

        self.submissions.write().await.push(RecordedSubmission {
            file: file.to_string(),
            accepted: rejection.is_none(),
            timestamp: Utc::now(),
        });

        match rejection {
            Some((status, body)) => Err(PrinterError::Rejected { status, body }),
            None => Ok(()),
        }
    }
}
