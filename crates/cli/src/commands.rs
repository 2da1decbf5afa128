use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use printqueue_core::{
    load_config, validate_config, Config, ConfigError, ConverterConfig, JobOutcome,
    JsonCsvConverter, JsonlTelemetryLog, PrintOrchestrator, PrinterClient, PrusaLinkClient,
    SanitizedConfig, TelemetrySink,
};

use crate::shutdown;

/// Load and validate the config file.
pub fn load(path: &Path) -> Result<Config> {
    info!("Loading configuration from {:?}", path);
    let config =
        load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?;
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

fn printer_client(config: &Config) -> Result<Arc<dyn PrinterClient>> {
    let client = PrusaLinkClient::new(config.printer.clone())
        .context("Failed to create PrusaLink client")?;
    info!("Using printer API at {}", config.printer.base_url);
    Ok(Arc::new(client))
}

/// `printqueue run`
pub async fn run(config_path: &Path) -> Result<()> {
    let config = load(config_path)?;

    let jobs = config.jobs.unique_files();
    if jobs.len() < config.jobs.files.len() {
        warn!(
            "Dropped {} duplicate job(s) from the queue",
            config.jobs.files.len() - jobs.len()
        );
    }
    if jobs.is_empty() {
        warn!("Job queue is empty, nothing to print");
        return Ok(());
    }

    let client = printer_client(&config)?;
    let sink: Arc<dyn TelemetrySink> = Arc::new(JsonlTelemetryLog::new(&config.telemetry.path));
    info!("Telemetry log: {:?}", config.telemetry.path);

    let orchestrator = PrintOrchestrator::new(config.orchestrator.clone(), jobs, client, sink);

    let cancel = CancellationToken::new();
    let signal_task = shutdown::cancel_on_signal(cancel.clone());

    let summary = orchestrator.run(&cancel).await;

    // Stops the signal task if no signal arrived.
    cancel.cancel();
    let _ = signal_task.await;

    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(failed) = summary
        .jobs
        .iter()
        .find(|j| matches!(j.outcome, JobOutcome::Failed { .. }))
    {
        bail!(
            "Queue halted at {} ({}/{} jobs attempted)",
            failed.file,
            summary.jobs.len(),
            summary.total_jobs
        );
    }
    if summary.halted() {
        warn!(
            "Run cancelled after {}/{} jobs",
            summary.jobs.len(),
            summary.total_jobs
        );
    }
    Ok(())
}

/// `printqueue status`
pub async fn status(config_path: &Path) -> Result<()> {
    let config = load(config_path)?;
    let client = printer_client(&config)?;

    let snapshot = client
        .status()
        .await
        .context("Failed to fetch printer status")?;
    info!(state = %snapshot.raw_state(), "Printer status fetched");

    println!("{}", serde_json::to_string_pretty(snapshot.document())?);
    Ok(())
}

/// Converter settings from the config file, or defaults when there is none.
fn converter_config(config_path: &Path) -> Result<ConverterConfig> {
    match load_config(config_path) {
        Ok(config) => Ok(config.converter),
        Err(ConfigError::FileNotFound(_)) => {
            info!(
                "No config at {:?}, using default converter settings",
                config_path
            );
            Ok(ConverterConfig::default())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load config from {:?}", config_path)),
    }
}

/// `printqueue convert`
pub fn convert(
    config_path: &Path,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut config = converter_config(config_path)?;
    if let Some(input) = input {
        config = config.with_input(input);
    }
    if let Some(output) = output {
        config = config.with_output(output);
    }

    let summary = JsonCsvConverter::new(&config)
        .convert(&config.input, &config.output)
        .context("Conversion failed")?;
    info!(
        rows = summary.rows,
        columns = summary.columns.len(),
        "Wrote {:?}",
        summary.output
    );
    Ok(())
}

/// `printqueue config`
pub fn show_config(config_path: &Path) -> Result<()> {
    let config = load(config_path)?;
    let sanitized = SanitizedConfig::from(&config);
    println!("{}", serde_json::to_string_pretty(&sanitized)?);
    Ok(())
}
