use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Printer base URL is http(s), username set, timeout non-zero
/// - Poll intervals non-zero, optional limits non-zero when set
/// - Backoff multiplier finite and >= 1.0
/// - Job file names are not blank
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let printer = &config.printer;
    if !(printer.base_url.starts_with("http://") || printer.base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "printer.base_url must start with http:// or https://, got {:?}",
            printer.base_url
        )));
    }
    if printer.username.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "printer.username cannot be empty".to_string(),
        ));
    }
    if printer.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "printer.timeout_secs cannot be 0".to_string(),
        ));
    }

    let orch = &config.orchestrator;
    if orch.collect_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.collect_interval_ms cannot be 0".to_string(),
        ));
    }
    if orch.completion_poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.completion_poll_interval_ms cannot be 0".to_string(),
        ));
    }
    if orch.completion_timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "orchestrator.completion_timeout_secs cannot be 0 (omit it to wait forever)"
                .to_string(),
        ));
    }
    if orch.max_consecutive_failures == Some(0) {
        return Err(ConfigError::ValidationError(
            "orchestrator.max_consecutive_failures cannot be 0 (omit it to retry forever)"
                .to_string(),
        ));
    }
    if !orch.backoff_multiplier.is_finite() || orch.backoff_multiplier < 1.0 {
        return Err(ConfigError::ValidationError(format!(
            "orchestrator.backoff_multiplier must be a finite number >= 1.0, got {}",
            orch.backoff_multiplier
        )));
    }

    if let Some(idx) = config.jobs.files.iter().position(|f| f.trim().is_empty()) {
        return Err(ConfigError::ValidationError(format!(
            "jobs.files[{}] is blank",
            idx
        )));
    }

    Ok(())
}
