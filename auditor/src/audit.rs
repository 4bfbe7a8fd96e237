//! The `check` procedure: discover, validate, verify and export
//!
//! Fatal problems surface as [`AuditError`], each with its own exit code.
//! Anything else ends in an [`AuditReport`] whose exit code tells whether
//! documents were rejected or records did not pass.

use crate::config::{AuditConfig, ConfigError};
use crate::explorer::{Explorer, ExplorerError};
use crate::export::{ExportError, Exporter};
use crate::repository::{GitRepository, MultiRepository, RepositoryError, RepositoryHandle};
use crate::validator::{ValidationFailure, Validator};
use crate::verifier::{Verifier, VerifierError};
use mtr_model::{TestRecord, VerificationResultError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const E_CONFIG_LOAD_ERROR: i32 = 1;
pub const E_MISSING_PARAMETER_ERROR: i32 = 2;
pub const E_NO_MTR_FILES_FOUND: i32 = 3;
pub const E_GIT_ERROR: i32 = 4;
pub const E_EXPORT_ERROR: i32 = 5;
pub const E_INCOMPATIBLE_REPOSITORY: i32 = 6;

pub const E_ERRORS_DETECTED: i32 = 16;
pub const E_FAILED_TESTS: i32 = 32;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Unable to load the given configuration file: {0}")]
    Config(#[source] ConfigError),

    #[error("Initialization error. Missing or malformed parameter. {0}")]
    Parameter(#[source] ConfigError),

    #[error("Initialization error. {0}")]
    Explorer(#[from] ExplorerError),

    #[error("Could not open the specified path: {} as a Git Repository. {source}", .path.display())]
    Repository {
        path: PathBuf,
        #[source]
        source: RepositoryError,
    },

    #[error("Incompatible git operation: {0}")]
    IncompatibleRepository(#[source] RepositoryError),

    #[error("Export failed. {0}")]
    Export(#[from] ExportError),

    #[error("Unable to record the verification time: {0}")]
    Timestamps(#[from] VerificationResultError),
}

impl AuditError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AuditError::Config(_) | AuditError::Timestamps(_) => E_CONFIG_LOAD_ERROR,
            AuditError::Parameter(_) => E_MISSING_PARAMETER_ERROR,
            AuditError::Explorer(ExplorerError::NoMtrFilesFound { .. }) => E_NO_MTR_FILES_FOUND,
            AuditError::Explorer(_) => E_MISSING_PARAMETER_ERROR,
            AuditError::Repository { .. } => E_GIT_ERROR,
            AuditError::IncompatibleRepository(_) => E_INCOMPATIBLE_REPOSITORY,
            AuditError::Export(_) => E_EXPORT_ERROR,
        }
    }
}

pub type AuditResult<T> = Result<T, AuditError>;

/// Options of a `check` run
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Overrides the configured path
    pub path: Option<PathBuf>,
    pub export: Vec<PathBuf>,
    pub multi_repo: bool,
}

/// Result of a completed `check` run
#[derive(Debug)]
pub struct AuditReport {
    pub path: PathBuf,
    pub records: Vec<TestRecord>,
    pub failures: Vec<ValidationFailure>,
}

impl AuditReport {
    /// Whether every record verified as passed
    pub fn all_passed(&self) -> bool {
        self.records.iter().all(|record| {
            record
                .verification_result
                .as_ref()
                .is_some_and(|result| result.is_passed())
        })
    }

    pub fn exit_code(&self) -> i32 {
        let mut exit_code = 0;
        if !self.failures.is_empty() {
            exit_code |= E_ERRORS_DETECTED;
        }
        if !self.all_passed() {
            exit_code |= E_FAILED_TESTS;
        }
        exit_code
    }
}

/// Runs the whole procedure with an already loaded configuration.
pub fn check(config: &AuditConfig, options: &CheckOptions) -> AuditResult<AuditReport> {
    config.validate().map_err(AuditError::Parameter)?;
    let path = resolve_path(config, options)?;

    let files = Explorer::new(&path, config.glob_patterns())?.files()?;
    let outcome = Validator::new(&files, &path).validate();
    let mut records = outcome.records;

    let repository = open_repository(&path, options.multi_repo)?;
    if !repository.is_multi() {
        log_repository(repository.as_ref());
    }

    Verifier::new(repository.as_ref())
        .verify(&mut records)
        .map_err(|error| match error {
            VerifierError::Repository(error) => AuditError::IncompatibleRepository(error),
            VerifierError::Timestamps(error) => AuditError::Timestamps(error),
        })?;

    if !options.export.is_empty() {
        Exporter::new(&records, &path, &options.export).export()?;
    }

    Ok(AuditReport {
        path,
        records,
        failures: outcome.failures,
    })
}

/// Command line path, then configured path, then the working directory
fn resolve_path(config: &AuditConfig, options: &CheckOptions) -> AuditResult<PathBuf> {
    let path = match options.path.as_ref().or(config.path.as_ref()) {
        Some(path) => path.clone(),
        None => std::env::current_dir()
            .map_err(|error| AuditError::Parameter(ConfigError::Invalid(error.to_string())))?,
    };

    Ok(std::path::absolute(&path).unwrap_or(path))
}

fn open_repository(path: &Path, multi_repo: bool) -> AuditResult<Box<dyn RepositoryHandle>> {
    if multi_repo {
        return Ok(Box::new(MultiRepository::new(path)));
    }

    let repository = GitRepository::open(path).map_err(|source| AuditError::Repository {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(repository))
}

/// Logs where the records are being verified. Purely informative, so failures
/// only produce warnings.
fn log_repository(repository: &dyn RepositoryHandle) {
    match repository.remote_uri_path() {
        Ok(remote) => info!("Remote: {remote}"),
        Err(error) => warn!("Unable to determine the repository remote: {error}"),
    }

    match (repository.branch(), repository.head()) {
        (Ok(branch), Ok(head)) => info!("Branch: {branch} at {} {}", head.sha, head.title),
        (Err(error), _) | (_, Err(error)) => {
            warn!("Unable to determine the repository HEAD: {error}");
            return;
        }
    }

    match repository.branches_with_head() {
        Ok(branches) => {
            let names: Vec<_> = branches.iter().map(|branch| branch.name.as_str()).collect();
            info!("Branches containing HEAD: {}", names.join(", "));
        }
        Err(error) => warn!("Unable to list the branches containing HEAD: {error}"),
    }
}
