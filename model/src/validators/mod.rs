//! Schema validation for Manual Test Records
//!
//! The chain has three layers:
//!
//! - [`fields`]: one validator per attribute (presence, type, format, enum
//!   membership). Each returns the normalized value for its field.
//! - [`entities`]: compose the field validators to turn a raw record or repo
//!   into its typed counterpart, enforcing the cross-field rules.
//! - [`data`]: the entry point. Normalizes the parsed document and reports
//!   every failure as a single [`FormatError`].
//!
//! # Example
//!
//! ```
//! use mtr_model::validators::DataValidator;
//!
//! let data: serde_yaml::Value = serde_yaml::from_str(
//!     "id: REQ_1\nresult: passed\nsha1: 0a1b2c3d\nfiles: src/main.cpp\n",
//! ).unwrap();
//!
//! let record = DataValidator::new(data, "mtr/REQ_1.yaml").validate().unwrap();
//! assert_eq!(record.files, Some(vec!["src/main.cpp".to_string()]));
//! ```

pub mod data;
pub mod entities;
pub mod fields;

pub use data::DataValidator;
pub use entities::{RepoValidator, TestRecordValidator};
pub use fields::FieldValidator;

use serde_yaml::Value;
use std::fmt;
use thiserror::Error;

/// A field or entity rule was violated
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required key: {key}")]
    MissingKey { key: String },

    #[error("Incompatible type for key {key}: Expected {expected} got {actual} instead")]
    IncompatibleType {
        key: String,
        expected: String,
        actual: ValueType,
    },

    #[error("Incompatible type for key {key}: Expected a Array<{expected}>. Found a(n) {actual} inside the array")]
    IncompatibleElement {
        key: String,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("Disallowed character '{character}' found in the value for key {key}. To use multiple requirement IDs please put them into an array")]
    DisallowedCharacter { key: String, character: char },

    #[error("Invalid value for key {key}: '{value}'. Valid values are {allowed}")]
    InvalidValue {
        key: String,
        value: String,
        allowed: String,
    },

    #[error("Invalid value for key {key}: '{value}'. Expected a string between {min} and {max} characters")]
    InvalidLength {
        key: String,
        value: String,
        min: usize,
        max: usize,
    },

    #[error("Invalid value for key {key}: '{value}'. Doesn't seem to be a valid hexadecimal string")]
    InvalidHex { key: String, value: String },

    #[error("Invalid MTR: {id}. Either '{first}' or '{second}' should be provided, not both")]
    MutuallyExclusive {
        id: String,
        first: &'static str,
        second: &'static str,
    },
}

impl ValidationError {
    /// The key the failure is attributed to. For mutually exclusive keys this
    /// is the first of the pair.
    pub fn key(&self) -> &str {
        match self {
            ValidationError::MissingKey { key }
            | ValidationError::IncompatibleType { key, .. }
            | ValidationError::IncompatibleElement { key, .. }
            | ValidationError::DisallowedCharacter { key, .. }
            | ValidationError::InvalidValue { key, .. }
            | ValidationError::InvalidLength { key, .. }
            | ValidationError::InvalidHex { key, .. } => key,
            ValidationError::MutuallyExclusive { first, .. } => first,
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// A document failed schema validation. Carries the message of the
/// underlying failure unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FormatError {
    pub message: String,
}

impl FormatError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ValidationError> for FormatError {
    fn from(error: ValidationError) -> Self {
        Self::new(error.to_string())
    }
}

/// The structural type of a YAML value, as reported in error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Array,
    Map,
    Tagged,
}

impl ValueType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Boolean,
            Value::Number(number) if number.is_f64() => ValueType::Float,
            Value::Number(_) => ValueType::Integer,
            Value::String(_) => ValueType::String,
            Value::Sequence(_) => ValueType::Array,
            Value::Mapping(_) => ValueType::Map,
            Value::Tagged(_) => ValueType::Tagged,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Null => "Null",
            ValueType::Boolean => "Boolean",
            ValueType::Integer => "Integer",
            ValueType::Float => "Float",
            ValueType::String => "String",
            ValueType::Array => "Array",
            ValueType::Map => "Map",
            ValueType::Tagged => "Tagged",
        };
        f.write_str(name)
    }
}
