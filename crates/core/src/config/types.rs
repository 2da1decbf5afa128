use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::converter::ConverterConfig;
use crate::orchestrator::{OrchestratorConfig, SubmitFailurePolicy};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub printer: PrinterConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
}

/// PrusaLink printer connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrinterConfig {
    /// API root (default: "http://192.168.1.100/api/v1")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Digest auth username (PrusaLink ships with "maker")
    #[serde(default = "default_username")]
    pub username: String,
    /// Digest auth password
    #[serde(default)]
    pub password: String,
    /// Per-request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_base_url() -> String {
    "http://192.168.1.100/api/v1".to_string()
}

fn default_username() -> String {
    "maker".to_string()
}

fn default_timeout() -> u32 {
    10
}

/// The print queue
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JobsConfig {
    /// File identifiers as known to the printer's storage
    #[serde(default)]
    pub files: Vec<String>,
}

impl JobsConfig {
    /// Configured files with duplicates removed, first occurrence wins.
    pub fn unique_files(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.files
            .iter()
            .filter(|f| seen.insert(f.as_str()))
            .cloned()
            .collect()
    }
}

/// Telemetry log settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_path")]
    pub path: PathBuf,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            path: default_telemetry_path(),
        }
    }
}

fn default_telemetry_path() -> PathBuf {
    PathBuf::from("printer_data_log.json")
}

/// Sanitized config for display (password redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub printer: SanitizedPrinterConfig,
    pub jobs: JobsConfig,
    pub orchestrator: SanitizedOrchestratorConfig,
    pub telemetry: TelemetryConfig,
    pub converter: ConverterConfig,
}

/// Sanitized printer config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPrinterConfig {
    pub base_url: String,
    pub username: String,
    pub password_configured: bool,
    pub timeout_secs: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedOrchestratorConfig {
    pub collect_interval_ms: u64,
    pub completion_poll_interval_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_consecutive_failures: Option<u32>,
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
    pub on_submit_failure: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let orch = &config.orchestrator;
        Self {
            printer: SanitizedPrinterConfig {
                base_url: config.printer.base_url.clone(),
                username: config.printer.username.clone(),
                password_configured: !config.printer.password.is_empty(),
                timeout_secs: config.printer.timeout_secs,
            },
            jobs: config.jobs.clone(),
            orchestrator: SanitizedOrchestratorConfig {
                collect_interval_ms: orch.collect_interval_ms,
                completion_poll_interval_ms: orch.completion_poll_interval_ms,
                completion_timeout_secs: orch.completion_timeout_secs,
                max_consecutive_failures: orch.max_consecutive_failures,
                backoff_multiplier: orch.backoff_multiplier,
                max_backoff_ms: orch.max_backoff_ms,
                on_submit_failure: match orch.on_submit_failure {
                    SubmitFailurePolicy::Continue => "continue".to_string(),
                    SubmitFailurePolicy::Skip => "skip".to_string(),
                },
            },
            telemetry: config.telemetry.clone(),
            converter: config.converter.clone(),
        }
    }
}
