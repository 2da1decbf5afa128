//! Configuration for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the JSON to CSV converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// JSON document to read.
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// CSV file to write.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Separator used when flattening nested objects into column names.
    #[serde(default = "default_separator")]
    pub flatten_separator: String,
}

fn default_input() -> PathBuf {
    PathBuf::from("data.json")
}

fn default_output() -> PathBuf {
    PathBuf::from("data.csv")
}

fn default_separator() -> String {
    ".".to_string()
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            flatten_separator: default_separator(),
        }
    }
}

impl ConverterConfig {
    /// Sets the input path.
    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = input.into();
        self
    }

    /// Sets the output path.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConverterConfig::default();
        assert_eq!(config.input, PathBuf::from("data.json"));
        assert_eq!(config.output, PathBuf::from("data.csv"));
        assert_eq!(config.flatten_separator, ".");
    }

    #[test]
    fn test_config_builder() {
        let config = ConverterConfig::default()
            .with_input("printer_data_log.json")
            .with_output("/tmp/telemetry.csv");

        assert_eq!(config.input, PathBuf::from("printer_data_log.json"));
        assert_eq!(config.output, PathBuf::from("/tmp/telemetry.csv"));
    }
}
