//! JSON to CSV conversion.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::types::{ConversionSummary, InputLayout};

/// Converts table-like JSON documents to CSV.
#[derive(Debug, Clone)]
pub struct JsonCsvConverter {
    separator: String,
}

impl Default for JsonCsvConverter {
    fn default() -> Self {
        Self::new(&ConverterConfig::default())
    }
}

impl JsonCsvConverter {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            separator: config.flatten_separator.clone(),
        }
    }

    /// Convert `input` to `output`.
    ///
    /// The output file is only created once the input has been fully parsed,
    /// so a missing or malformed input never leaves a CSV behind.
    pub fn convert(&self, input: &Path, output: &Path) -> Result<ConversionSummary, ConverterError> {
        let text = std::fs::read_to_string(input).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConverterError::InputNotFound {
                path: input.to_path_buf(),
            },
            _ => ConverterError::Io(e),
        })?;

        let (layout, records) = parse_records(&text)?;
        debug!(?layout, records = records.len(), "Parsed JSON input");

        let table = Table::build(&records, &self.separator);
        if table.columns.is_empty() && !table.rows.is_empty() {
            return Err(ConverterError::unsupported_shape(format!(
                "{} record(s) without any fields",
                table.rows.len()
            )));
        }
        table.write(output)?;

        info!(
            "Successfully converted '{}' to '{}'",
            input.display(),
            output.display()
        );

        Ok(ConversionSummary {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            rows: table.rows.len(),
            columns: table.columns,
        })
    }
}

/// Convert with default settings.
pub fn convert_json_to_csv(input: &Path, output: &Path) -> Result<ConversionSummary, ConverterError> {
    JsonCsvConverter::default().convert(input, output)
}

fn parse_records(text: &str) -> Result<(InputLayout, Vec<Map<String, Value>>), ConverterError> {
    if text.trim().is_empty() {
        return Err(ConverterError::unsupported_shape("empty document"));
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => {
            let records = items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(map) => Ok(map),
                    other => Err(ConverterError::unsupported_shape(format!(
                        "array element {} is {}, expected an object",
                        i,
                        kind(&other)
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((InputLayout::Records, records))
        }
        Ok(Value::Object(map)) => {
            if !map.is_empty() && map.values().all(Value::is_array) {
                Ok((InputLayout::Columns, columns_to_records(map)))
            } else {
                Ok((InputLayout::SingleRecord, vec![map]))
            }
        }
        Ok(other) => Err(ConverterError::unsupported_shape(format!(
            "top-level {} is not a table",
            kind(&other)
        ))),
        Err(e) => {
            let lines: Vec<(usize, &str)> = text
                .lines()
                .enumerate()
                .filter(|(_, l)| !l.trim().is_empty())
                .collect();
            if lines.len() < 2 {
                return Err(ConverterError::parse(e.to_string()));
            }
            parse_json_lines(&lines).map(|records| (InputLayout::JsonLines, records))
        }
    }
}

fn parse_json_lines(lines: &[(usize, &str)]) -> Result<Vec<Map<String, Value>>, ConverterError> {
    lines
        .iter()
        .map(|(idx, line)| match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ConverterError::unsupported_shape(format!(
                "line {} is {}, expected an object",
                idx + 1,
                kind(&other)
            ))),
            Err(e) => Err(ConverterError::parse(format!("line {}: {}", idx + 1, e))),
        })
        .collect()
}

/// `{"a": [1, 2], "b": [3]}` -> `[{"a": 1, "b": 3}, {"a": 2}]`
fn columns_to_records(columns: Map<String, Value>) -> Vec<Map<String, Value>> {
    let len = columns
        .values()
        .filter_map(Value::as_array)
        .map(Vec::len)
        .max()
        .unwrap_or(0);

    let mut records = vec![Map::new(); len];
    for (key, column) in columns {
        if let Value::Array(values) = column {
            for (record, value) in records.iter_mut().zip(values) {
                record.insert(key.clone(), value);
            }
        }
    }
    records
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Flattened rows with a shared header.
#[derive(Debug)]
struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    fn build(records: &[Map<String, Value>], separator: &str) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut flat_rows = Vec::with_capacity(records.len());

        for record in records {
            let mut cells = Vec::new();
            flatten(None, record, separator, &mut cells);
            for (key, _) in &cells {
                if !index.contains_key(key) {
                    index.insert(key.clone(), columns.len());
                    columns.push(key.clone());
                }
            }
            flat_rows.push(cells);
        }

        let rows = flat_rows
            .into_iter()
            .map(|cells| {
                let mut row = vec![None; columns.len()];
                for (key, cell) in cells {
                    row[index[&key]] = Some(cell);
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// A table without columns (no records at all) is written as an empty file.
    fn write(&self, output: &Path) -> Result<(), ConverterError> {
        if self.columns.is_empty() {
            std::fs::write(output, "")?;
            return Ok(());
        }

        let mut writer = csv::Writer::from_path(output)?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn flatten(
    prefix: Option<&str>,
    object: &Map<String, Value>,
    separator: &str,
    out: &mut Vec<(String, String)>,
) {
    for (key, value) in object {
        let name = match prefix {
            Some(prefix) => format!("{}{}{}", prefix, separator, key),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) if !nested.is_empty() => {
                flatten(Some(&name), nested, separator, out)
            }
            other => out.push((name, render_cell(other))),
        }
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            value.to_string()
        }
    }
}
