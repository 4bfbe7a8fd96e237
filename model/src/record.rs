//! Manual Test Record entities
//!
//! A [`TestRecord`] is the validated form of one MTR document. Records are
//! never built directly from YAML: the raw document is first captured as a
//! [`RawTestRecord`] (keys looked up, values untouched) and then turned into a
//! [`TestRecord`] by [`TestRecordValidator`](crate::validators::entities::TestRecordValidator).

use crate::verification::VerificationResult;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::PathBuf;

pub const PASSED_RESULT: &str = "passed";
pub const FAILED_RESULT: &str = "failed";
pub const REVIEWED_STATUS: &str = "reviewed";
pub const NO_FINDINGS: &str = "no findings";

/// Result declared by the tester in the MTR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordResult {
    Passed,
    Failed,
}

impl RecordResult {
    pub const VALID_VALUES: [&'static str; 2] = [PASSED_RESULT, FAILED_RESULT];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordResult::Passed => PASSED_RESULT,
            RecordResult::Failed => FAILED_RESULT,
        }
    }
}

impl fmt::Display for RecordResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Looks up `key` in a normalized mapping. `null` values count as absent.
fn lookup(mapping: &Mapping, key: &str) -> Option<Value> {
    mapping
        .get(key)
        .filter(|value| !value.is_null())
        .cloned()
}

/// The attributes of an MTR as they were found in the document, before any
/// validation took place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTestRecord {
    pub id: Option<Value>,
    pub result: Option<Value>,
    pub sha1: Option<Value>,
    pub name: Option<Value>,
    pub description: Option<Value>,
    pub files: Option<Value>,
    pub repos: Option<Value>,
    pub review_status: Option<Value>,
    pub review_comments: Option<Value>,
    pub findings: Option<Value>,
    pub test_method: Option<Value>,
    pub tc_derivation_method: Option<Value>,
    pub source_file: PathBuf,
}

impl RawTestRecord {
    /// Captures the known keys of an already normalized mapping. Unknown keys
    /// are ignored. `reviewstatus` and `reviewcomments` are accepted as
    /// legacy spellings.
    pub fn from_mapping(mapping: &Mapping) -> Self {
        Self {
            id: lookup(mapping, "id"),
            result: lookup(mapping, "result"),
            sha1: lookup(mapping, "sha1"),
            name: lookup(mapping, "name"),
            description: lookup(mapping, "description"),
            files: lookup(mapping, "files"),
            repos: lookup(mapping, "repos"),
            review_status: lookup(mapping, "review_status")
                .or_else(|| lookup(mapping, "reviewstatus")),
            review_comments: lookup(mapping, "review_comments")
                .or_else(|| lookup(mapping, "reviewcomments")),
            findings: lookup(mapping, "findings"),
            test_method: lookup(mapping, "test_method"),
            tc_derivation_method: lookup(mapping, "tc_derivation_method"),
            source_file: PathBuf::new(),
        }
    }

    pub fn with_source_file(mut self, source_file: impl Into<PathBuf>) -> Self {
        self.source_file = source_file.into();
        self
    }
}

/// A `repos` entry as found in the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRepo {
    pub path: Option<Value>,
    pub sha1: Option<Value>,
    pub files: Option<Value>,
}

impl RawRepo {
    pub fn from_mapping(mapping: &Mapping) -> Self {
        Self {
            path: lookup(mapping, "path"),
            sha1: lookup(mapping, "sha1"),
            files: lookup(mapping, "files"),
        }
    }
}

/// A sub-repository referenced by a multi-repo MTR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    /// Path of the repository, relative to the multi-repo root or absolute
    pub path: String,

    /// Commit the repository was at when the test was performed
    pub sha1: String,

    /// Files (or glob patterns, before resolution) covered by the MTR
    pub files: Option<Vec<String>>,
}

/// A validated Manual Test Record
#[derive(Debug, Clone)]
pub struct TestRecord {
    /// Requirement identifier(s) covered by the test
    pub id: Vec<String>,
    pub result: RecordResult,
    /// Commit the test was performed on. Absent when `repos` is given.
    pub sha1: Option<String>,
    /// Tester name(s)
    pub name: Option<Vec<String>>,
    pub description: Option<String>,
    /// Covered files. Mutually exclusive with `repos`.
    pub files: Option<Vec<String>>,
    /// Covered sub-repositories. Mutually exclusive with `files` and `sha1`.
    pub repos: Option<Vec<Repo>>,
    pub review_status: Option<String>,
    pub review_comments: Option<String>,
    pub findings: Option<String>,
    pub test_method: Option<Vec<String>>,
    pub tc_derivation_method: Option<Vec<String>>,
    /// The document the record was loaded from
    pub source_file: PathBuf,
    /// Set once the record went through verification
    pub verification_result: Option<VerificationResult>,
}

impl TestRecord {
    /// Builds a minimal record carrying only a commit and (optionally) a list
    /// of files. Used to verify a single sub-repository with the same checks
    /// that apply to whole records.
    pub fn proxy(sha1: impl Into<String>, files: Option<Vec<String>>) -> Self {
        Self {
            id: Vec::new(),
            result: RecordResult::Passed,
            sha1: Some(sha1.into()),
            name: None,
            description: None,
            files,
            repos: None,
            review_status: None,
            review_comments: None,
            findings: None,
            test_method: None,
            tc_derivation_method: None,
            source_file: PathBuf::new(),
            verification_result: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.result == RecordResult::Passed
    }

    pub fn reviewed(&self) -> bool {
        self.review_status.as_deref() == Some(REVIEWED_STATUS)
    }

    /// True when the reviewer left findings. Blank text and "no findings"
    /// (in any casing) do not count.
    pub fn has_findings(&self) -> bool {
        match self.findings.as_deref() {
            None => false,
            Some(findings) => {
                let trimmed = findings.trim();
                !trimmed.is_empty() && findings.to_lowercase() != NO_FINDINGS
            }
        }
    }

    /// Requirement IDs joined for display
    pub fn id_label(&self) -> String {
        self.id.join(", ")
    }
}
