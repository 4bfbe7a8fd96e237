//! Batch loading and validation of MTR documents
//!
//! Every document goes through the same pipeline: read, parse, schema
//! validation, then resolution of its files and repos. A document failing any
//! step is set aside as a [`ValidationFailure`]; the others become records.

use crate::resolver::{FilesResolver, ReposResolver, ResolveError};
use mtr_model::{DataValidator, FormatError, TestRecord};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

/// Why a document could not be loaded
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl LoadError {
    /// Category shown next to the file in reports
    pub fn message(&self) -> &'static str {
        match self {
            LoadError::Io(_) => "IO Error: Cannot read the specified file",
            LoadError::Yaml(_) => "YAML Parsing Error",
            LoadError::Format(_) => "YAML Formatting Error",
            LoadError::Resolve(ResolveError::RepoPathNotFound { .. }) => {
                "Referenced repository not found"
            }
            LoadError::Resolve(_) => "Referenced file not found in repository",
        }
    }
}

/// A document that was left out of the run
#[derive(Debug)]
pub struct ValidationFailure {
    pub file: PathBuf,
    pub message: &'static str,
    pub cause: LoadError,
}

/// Records that passed validation plus the documents that did not
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub records: Vec<TestRecord>,
    pub failures: Vec<ValidationFailure>,
}

impl ValidationOutcome {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

pub struct Validator<'a> {
    files: &'a [PathBuf],
    path: &'a Path,
}

impl<'a> Validator<'a> {
    /// `path` is the base the declared files and repos are resolved against.
    pub fn new(files: &'a [PathBuf], path: &'a Path) -> Self {
        Self { files, path }
    }

    /// Validates every file, in order.
    pub fn validate(&self) -> ValidationOutcome {
        info!("Validating MTR Files...");

        let mut outcome = ValidationOutcome::default();
        for file in self.files {
            info!("Validating {}...", file.display());

            match self.validate_file(file) {
                Ok(record) => {
                    info!("✔ SUCCESS {} Successfully loaded", file.display());
                    outcome.records.push(record);
                }
                Err(cause) => {
                    let message = cause.message();
                    error!("✘ FAILED {} Failed: {message} - {cause}", file.display());
                    outcome.failures.push(ValidationFailure {
                        file: file.clone(),
                        message,
                        cause,
                    });
                }
            }
        }

        outcome
    }

    fn validate_file(&self, file: &Path) -> Result<TestRecord, LoadError> {
        let contents = fs::read_to_string(file)?;
        let data: serde_yaml::Value = serde_yaml::from_str(&contents)?;

        let mut record = DataValidator::new(data, file).validate()?;
        FilesResolver::new(self.path).resolve(&mut record)?;
        ReposResolver::new(self.path).resolve(&mut record)?;

        Ok(record)
    }
}
