//! Field validators
//!
//! Each validator checks a single attribute and returns its normalized value.
//! Validators never see the rest of the record; cross-field rules live in
//! [`entities`](super::entities).

use super::entities::RepoValidator;
use super::{ValidationError, ValidationResult, ValueType};
use crate::record::{RawRepo, RecordResult, Repo};
use serde_yaml::Value;

pub const SHA1_MIN_LENGTH: usize = 7;
pub const SHA1_MAX_LENGTH: usize = 40;

pub trait FieldValidator {
    type Output;

    fn validate(&self, key: &str, value: Option<&Value>) -> ValidationResult<Self::Output>;
}

fn validate_presence<'a>(key: &str, value: Option<&'a Value>) -> ValidationResult<&'a Value> {
    value.ok_or_else(|| ValidationError::MissingKey {
        key: key.to_string(),
    })
}

fn incompatible_type(key: &str, value: &Value, expected: &[ValueType]) -> ValidationError {
    ValidationError::IncompatibleType {
        key: key.to_string(),
        expected: expected
            .iter()
            .map(ValueType::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        actual: ValueType::of(value),
    }
}

fn validate_string<'a>(key: &str, value: &'a Value) -> ValidationResult<&'a str> {
    value
        .as_str()
        .ok_or_else(|| incompatible_type(key, value, &[ValueType::String]))
}

/// Checks that every element of `array` is a string and collects them.
fn validate_string_array(key: &str, array: &[Value]) -> ValidationResult<Vec<String>> {
    array
        .iter()
        .map(|element| match element {
            Value::String(string) => Ok(string.clone()),
            other => Err(ValidationError::IncompatibleElement {
                key: key.to_string(),
                expected: ValueType::String,
                actual: ValueType::of(other),
            }),
        })
        .collect()
}

/// Requirement ID(s): a string or an array of strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdValidator;

impl FieldValidator for IdValidator {
    type Output = Vec<String>;

    fn validate(&self, key: &str, value: Option<&Value>) -> ValidationResult<Vec<String>> {
        match validate_presence(key, value)? {
            Value::String(id) => match id.chars().find(|c| *c == ',' || c.is_whitespace()) {
                Some(character) => Err(ValidationError::DisallowedCharacter {
                    key: key.to_string(),
                    character,
                }),
                None => Ok(vec![id.clone()]),
            },
            Value::Sequence(ids) => validate_string_array(key, ids),
            other => Err(incompatible_type(
                key,
                other,
                &[ValueType::String, ValueType::Array],
            )),
        }
    }
}

/// The declared test result, normalized to lowercase.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResultValidator;

impl FieldValidator for ResultValidator {
    type Output = RecordResult;

    fn validate(&self, key: &str, value: Option<&Value>) -> ValidationResult<RecordResult> {
        let result = validate_string(key, validate_presence(key, value)?)?.to_lowercase();
        match result.as_str() {
            "passed" => Ok(RecordResult::Passed),
            "failed" => Ok(RecordResult::Failed),
            _ => Err(ValidationError::InvalidValue {
                key: key.to_string(),
                value: result,
                allowed: RecordResult::VALID_VALUES.join(", "),
            }),
        }
    }
}

/// A commit identifier: 7 to 40 hexadecimal characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha1Validator;

impl FieldValidator for Sha1Validator {
    type Output = String;

    fn validate(&self, key: &str, value: Option<&Value>) -> ValidationResult<String> {
        let sha1 = validate_string(key, validate_presence(key, value)?)?;

        let length = sha1.chars().count();
        if !(SHA1_MIN_LENGTH..=SHA1_MAX_LENGTH).contains(&length) {
            return Err(ValidationError::InvalidLength {
                key: key.to_string(),
                value: sha1.to_string(),
                min: SHA1_MIN_LENGTH,
                max: SHA1_MAX_LENGTH,
            });
        }

        if !sha1.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidHex {
                key: key.to_string(),
                value: sha1.to_string(),
            });
        }

        Ok(sha1.to_string())
    }
}

/// Files covered by a record or repo: absent, a single string or an array of
/// strings. Always normalized to a list.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilesValidator;

impl FieldValidator for FilesValidator {
    type Output = Option<Vec<String>>;

    fn validate(&self, key: &str, value: Option<&Value>) -> ValidationResult<Option<Vec<String>>> {
        let Some(value) = value else {
            return Ok(None);
        };
        match value {
            Value::String(file) => Ok(Some(vec![file.clone()])),
            Value::Sequence(files) => validate_string_array(key, files).map(Some),
            other => Err(incompatible_type(
                key,
                other,
                &[ValueType::String, ValueType::Array],
            )),
        }
    }
}

/// Meta-data fields (`name`, `test_method`, `tc_derivation_method`). Absent
/// and empty arrays both normalize to `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetaDataFieldValidator;

impl FieldValidator for MetaDataFieldValidator {
    type Output = Option<Vec<String>>;

    fn validate(&self, key: &str, value: Option<&Value>) -> ValidationResult<Option<Vec<String>>> {
        let Some(value) = value else {
            return Ok(None);
        };
        match value {
            Value::String(entry) => Ok(Some(vec![entry.clone()])),
            Value::Sequence(entries) if entries.is_empty() => Ok(None),
            Value::Sequence(entries) => validate_string_array(key, entries).map(Some),
            other => Err(incompatible_type(
                key,
                other,
                &[ValueType::String, ValueType::Array],
            )),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DescriptionValidator;

impl FieldValidator for DescriptionValidator {
    type Output = Option<String>;

    fn validate(&self, key: &str, value: Option<&Value>) -> ValidationResult<Option<String>> {
        let Some(value) = value else {
            return Ok(None);
        };
        validate_string(key, value).map(|description| Some(description.to_string()))
    }
}

/// Free text fields filled in by the reviewer (`review_status`,
/// `review_comments`, `findings`). Scalars are taken as their text form,
/// collections are rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextValidator;

impl FieldValidator for TextValidator {
    type Output = Option<String>;

    fn validate(&self, key: &str, value: Option<&Value>) -> ValidationResult<Option<String>> {
        let Some(value) = value else {
            return Ok(None);
        };

        match value {
            Value::String(text) => Ok(Some(text.clone())),
            Value::Bool(flag) => Ok(Some(flag.to_string())),
            Value::Number(number) => Ok(Some(number.to_string())),
            other => Err(incompatible_type(key, other, &[ValueType::String])),
        }
    }
}

/// The `path` of a sub-repository.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathValidator;

impl FieldValidator for PathValidator {
    type Output = String;

    fn validate(&self, key: &str, value: Option<&Value>) -> ValidationResult<String> {
        validate_string(key, validate_presence(key, value)?).map(str::to_string)
    }
}

/// The `repos` attribute: a map or an array of maps, each one a valid repo.
/// An empty array normalizes to `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReposValidator;

impl FieldValidator for ReposValidator {
    type Output = Option<Vec<Repo>>;

    fn validate(&self, key: &str, value: Option<&Value>) -> ValidationResult<Option<Vec<Repo>>> {
        let Some(value) = value else {
            return Ok(None);
        };
        let mappings = match value {
            Value::Mapping(mapping) => vec![mapping],
            Value::Sequence(entries) if entries.is_empty() => return Ok(None),
            Value::Sequence(entries) => entries
                .iter()
                .map(|entry| match entry {
                    Value::Mapping(mapping) => Ok(mapping),
                    other => Err(ValidationError::IncompatibleElement {
                        key: key.to_string(),
                        expected: ValueType::Map,
                        actual: ValueType::of(other),
                    }),
                })
                .collect::<ValidationResult<Vec<_>>>()?,
            other => {
                return Err(incompatible_type(
                    key,
                    other,
                    &[ValueType::Map, ValueType::Array],
                ))
            }
        };

        mappings
            .into_iter()
            .map(|mapping| RepoValidator::new(&RawRepo::from_mapping(mapping)).validate())
            .collect::<ValidationResult<Vec<_>>>()
            .map(Some)
    }
}
