pub mod config;
pub mod converter;
pub mod orchestrator;
pub mod printer;
pub mod telemetry;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, JobsConfig,
    PrinterConfig, SanitizedConfig, TelemetryConfig,
};
pub use converter::{
    convert_json_to_csv, ConversionSummary, ConverterConfig, ConverterError, JsonCsvConverter,
};
pub use orchestrator::{
    CollectionOutcome, CompletionWaiter, DataCollector, JobOutcome, JobReport, OrchestratorConfig,
    OrchestratorError, PollPolicy, PrintOrchestrator, RunSummary, SubmitFailurePolicy,
    WaitOutcome,
};
pub use printer::{
    fetch_status, PrinterClient, PrinterError, PrinterState, PrusaLinkClient, StatusSnapshot,
};
pub use telemetry::{JsonlTelemetryLog, TelemetryError, TelemetryRecord, TelemetrySink};
