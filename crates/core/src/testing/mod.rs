//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the printer and telemetry
//! traits, allowing orchestrator tests without a real printer.
//!
//! # Example
//!
//! ```rust,ignore
//! use printqueue_core::testing::{MockPrinter, MemoryTelemetrySink};
//!
//! let printer = Arc::new(MockPrinter::with_states(&["PRINTING", "FINISHED"]));
//! let sink = Arc::new(MemoryTelemetrySink::new());
//!
//! let orchestrator = PrintOrchestrator::new(config, jobs, printer.clone(), sink.clone());
//! orchestrator.run(&CancellationToken::new()).await;
//! assert_eq!(sink.len().await, 2);
//! ```

mod memory_sink;
mod mock_printer;

pub use memory_sink::MemoryTelemetrySink;
pub use mock_printer::{MockPrinter, RecordedSubmission};

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::orchestrator::OrchestratorConfig;

    /// A PrusaLink v1 style status document in the given state.
    pub fn status_document(state: &str) -> Value {
        let heating = matches!(state, "PRINTING" | "PAUSED");
        let (nozzle, bed) = if heating { (215.0, 60.0) } else { (24.5, 23.8) };
        let (target_nozzle, target_bed) = if heating { (215.0, 60.0) } else { (0.0, 0.0) };

        let mut doc = json!({
            "storage": {"path": "/usb/", "name": "usb", "read_only": false},
            "printer": {
                "state": state,
                "temp_nozzle": nozzle,
                "target_nozzle": target_nozzle,
                "temp_bed": bed,
                "target_bed": target_bed,
                "axis_z": 1.2,
                "flow": 100,
                "speed": 100,
                "fan_hotend": 0,
                "fan_print": 0
            }
        });
        if heating || state == "FINISHED" {
            let (progress, time_remaining) = if state == "FINISHED" { (100.0, 0) } else { (37.0, 660) };
            doc["job"] = json!({
                "id": 42,
                "progress": progress,
                "time_remaining": time_remaining,
                "time_printing": 420
            });
        }
        doc
    }

    /// Orchestrator config with millisecond intervals for fast tests.
    pub fn fast_orchestrator_config() -> OrchestratorConfig {
        OrchestratorConfig {
            collect_interval_ms: 5,
            completion_poll_interval_ms: 5,
            max_backoff_ms: 20,
            ..Default::default()
        }
    }
}
