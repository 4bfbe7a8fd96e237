//! Report export
//!
//! Targets are plain file names; the format of each is deduced from its
//! extension. Every format is rendered once and written to all of its targets.

use crate::resolver::relative_path;
use mtr_model::{RecordResult, Repo, TestRecord, VerificationResult};
use serde::Serialize;
use sha1::{Digest, Sha1};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// `%F %T %z`
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Length of the record IDs in reports
const ID_LENGTH: usize = 16;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unknown export format: '{extension}'. Valid export formats are: {}", ExportFormat::extensions().join(", "))]
    UnknownFormat { extension: String },

    #[error("Unable to write report output to {}: {source}", .target.display())]
    UnableToWrite {
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to serialize the report: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 1] = [ExportFormat::Json];

    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
        }
    }

    /// File extensions, with the leading dot
    pub fn extensions_of(&self) -> &'static [&'static str] {
        match self {
            ExportFormat::Json => &[".json"],
        }
    }

    /// Every known extension
    pub fn extensions() -> Vec<&'static str> {
        Self::ALL
            .iter()
            .flat_map(|format| format.extensions_of().iter().copied())
            .collect()
    }

    /// Format for the given target, from its (case-insensitive) extension
    pub fn for_target(target: &Path) -> ExportResult<Self> {
        let extension = target
            .extension()
            .map(|extension| format!(".{}", extension.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        Self::ALL
            .into_iter()
            .find(|format| format.extensions_of().contains(&extension.as_str()))
            .ok_or(ExportError::UnknownFormat { extension })
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stable identifier of a record in reports: the leading hex digits of the
/// SHA-1 of its document path (relative to the base) followed by its ids.
/// A single id is hashed as is, several ids as a quoted list
/// (`["REQ_1", "REQ_2"]`).
pub struct IdGenerator<'a> {
    base: &'a Path,
}

impl<'a> IdGenerator<'a> {
    pub fn new(base: &'a Path) -> Self {
        Self { base }
    }

    pub fn id_for(&self, record: &TestRecord) -> String {
        let ids = match record.id.as_slice() {
            [id] => id.clone(),
            ids => format!("{ids:?}"),
        };

        let mut hasher = Sha1::new();
        hasher.update(relative_path(self.base, &record.source_file).as_bytes());
        hasher.update(ids.as_bytes());
        let digest = hasher.finalize();

        hex_encode(&digest.as_slice()[..ID_LENGTH / 2])
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

#[derive(Debug, Serialize)]
struct VerificationResultJson<'a> {
    status: &'static str,
    started_at: Option<String>,
    finished_at: Option<String>,
    runtime: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

impl<'a> From<&'a VerificationResult> for VerificationResultJson<'a> {
    fn from(result: &'a VerificationResult) -> Self {
        Self {
            status: result.status().as_str(),
            started_at: result
                .started_at()
                .map(|time| time.format(DATE_FORMAT).to_string()),
            finished_at: result
                .finished_at()
                .map(|time| time.format(DATE_FORMAT).to_string()),
            runtime: result.runtime_seconds(),
            reason: result.reason(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RepoJson<'a> {
    path: &'a str,
    sha1: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<&'a [String]>,
}

impl<'a> From<&'a Repo> for RepoJson<'a> {
    fn from(repo: &'a Repo) -> Self {
        Self {
            path: &repo.path,
            sha1: &repo.sha1,
            files: non_empty(repo.files.as_deref()),
        }
    }
}

#[derive(Debug, Serialize)]
struct TestRecordJson<'a> {
    id: String,
    refs: &'a [String],
    result: RecordResult,
    review_status: &'static str,
    verification_result: Option<VerificationResultJson<'a>>,
    started_at: Option<String>,
    finished_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha1: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    test_method: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tc_derivation_method: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    review_comments: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    findings: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repos: Option<Vec<RepoJson<'a>>>,
}

impl<'a> TestRecordJson<'a> {
    fn new(record: &'a TestRecord, id: String) -> Self {
        let verification_result = record
            .verification_result
            .as_ref()
            .map(VerificationResultJson::from);
        let started_at = verification_result
            .as_ref()
            .and_then(|result| result.started_at.clone());
        let finished_at = verification_result
            .as_ref()
            .and_then(|result| result.finished_at.clone());

        Self {
            id,
            refs: &record.id,
            result: record.result,
            review_status: if record.reviewed() {
                "reviewed"
            } else {
                "not_reviewed"
            },
            verification_result,
            started_at,
            finished_at,
            sha1: present(record.sha1.as_deref()),
            owner: non_empty(record.name.as_deref()).map(|names| names.join(", ")),
            description: present(record.description.as_deref()),
            test_method: non_empty(record.test_method.as_deref()),
            tc_derivation_method: non_empty(record.tc_derivation_method.as_deref()),
            review_comments: present(record.review_comments.as_deref()),
            findings: record
                .findings
                .as_deref()
                .filter(|_| record.has_findings()),
            files: non_empty(record.files.as_deref()),
            repos: non_empty(record.repos.as_deref())
                .map(|repos| repos.iter().map(RepoJson::from).collect()),
        }
    }
}

/// Text that is not blank
fn present(text: Option<&str>) -> Option<&str> {
    text.filter(|text| !text.trim().is_empty())
}

fn non_empty<T>(items: Option<&[T]>) -> Option<&[T]> {
    items.filter(|items| !items.is_empty())
}

/// Renders the records as a JSON array
pub struct JsonExporter<'a> {
    records: &'a [TestRecord],
    ids: IdGenerator<'a>,
}

impl<'a> JsonExporter<'a> {
    /// `base` is the path record IDs are computed relative to.
    pub fn new(records: &'a [TestRecord], base: &'a Path) -> Self {
        Self {
            records,
            ids: IdGenerator::new(base),
        }
    }

    pub fn export(&self) -> ExportResult<String> {
        info!("Exporting data to JSON");

        let records: Vec<_> = self
            .records
            .iter()
            .map(|record| TestRecordJson::new(record, self.ids.id_for(record)))
            .collect();

        Ok(serde_json::to_string(&records)?)
    }
}

/// Writes the verified records to every requested target
pub struct Exporter<'a> {
    records: &'a [TestRecord],
    base: &'a Path,
    targets: &'a [PathBuf],
}

impl<'a> Exporter<'a> {
    pub fn new(records: &'a [TestRecord], base: &'a Path, targets: &'a [PathBuf]) -> Self {
        Self {
            records,
            base,
            targets,
        }
    }

    /// Groups the targets by format, keeping the order in which each format
    /// first appears. Fails on the first unknown extension, before anything
    /// is written.
    pub fn formats(&self) -> ExportResult<Vec<(ExportFormat, Vec<&'a Path>)>> {
        let mut formats: Vec<(ExportFormat, Vec<&'a Path>)> = Vec::new();

        for target in self.targets {
            let format = ExportFormat::for_target(target)?;
            match formats.iter_mut().find(|(known, _)| *known == format) {
                Some((_, targets)) => targets.push(target.as_path()),
                None => formats.push((format, vec![target.as_path()])),
            }
        }

        Ok(formats)
    }

    pub fn export(&self) -> ExportResult<()> {
        info!("Starting export process...");
        let formats = self.formats()?;

        for (format, targets) in formats {
            let text = match format {
                ExportFormat::Json => JsonExporter::new(self.records, self.base).export()?,
            };

            for target in targets {
                write_output(&text, format, target)?;
            }
        }

        Ok(())
    }
}

fn write_output(text: &str, format: ExportFormat, target: &Path) -> ExportResult<()> {
    info!("Writing {format} output to {}...", target.display());

    fs::write(target, text).map_err(|source| ExportError::UnableToWrite {
        target: target.to_path_buf(),
        source,
    })?;

    debug!("Ok ({} bytes written)", text.len());
    Ok(())
}
