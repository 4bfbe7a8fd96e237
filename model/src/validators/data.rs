use super::entities::TestRecordValidator;
use super::{FormatError, ValueType};
use crate::record::{RawTestRecord, TestRecord};
use serde_yaml::{Mapping, Value};
use std::path::PathBuf;
use tracing::debug;

/// Entry point of the schema validation chain
///
/// Takes the parsed contents of one MTR document and produces a validated
/// [`TestRecord`]. Every failure, whatever its cause, is reported as a
/// [`FormatError`].
pub struct DataValidator {
    data: Value,
    source_file: PathBuf,
}

impl DataValidator {
    pub fn new(data: Value, source_file: impl Into<PathBuf>) -> Self {
        Self {
            data,
            source_file: source_file.into(),
        }
    }

    pub fn validate(self) -> Result<TestRecord, FormatError> {
        let mapping = match self.data {
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(FormatError::new(format!(
                    "Incompatible data structure. Expecting a Map, got a {}",
                    ValueType::of(&other)
                )))
            }
        };

        let mapping = normalize_mapping(mapping);
        let raw = RawTestRecord::from_mapping(&mapping).with_source_file(self.source_file);

        debug!("Validating MTR data from {}", raw.source_file.display());
        TestRecordValidator::new(&raw)
            .validate()
            .map_err(FormatError::from)
    }
}

/// Gives every key its canonical string form and removes the trailing newline
/// YAML block scalars leave on string values, recursively.
fn normalize_mapping(mapping: Mapping) -> Mapping {
    mapping
        .into_iter()
        .map(|(key, value)| (normalize_key(key), normalize_value(value)))
        .collect()
}

fn normalize_key(key: Value) -> Value {
    match key {
        Value::String(key) => Value::String(key),
        Value::Bool(key) => Value::String(key.to_string()),
        Value::Number(key) => Value::String(key.to_string()),
        other => other,
    }
}

fn normalize_value(value: Value) -> Value {
    match value {
        Value::String(string) => Value::String(chomp(string)),
        Value::Sequence(values) => Value::Sequence(values.into_iter().map(normalize_value).collect()),
        Value::Mapping(mapping) => Value::Mapping(normalize_mapping(mapping)),
        other => other,
    }
}

/// Removes a single trailing line terminator (`\n`, `\r\n` or `\r`).
fn chomp(mut string: String) -> String {
    if string.ends_with('\n') {
        string.pop();
        if string.ends_with('\r') {
            string.pop();
        }
    } else if string.ends_with('\r') {
        string.pop();
    }
    string
}
