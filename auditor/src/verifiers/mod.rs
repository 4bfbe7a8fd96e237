//! Per-record verification
//!
//! Decides whether the result recorded in an MTR still holds for the current
//! state of the repository. [`TestRecordVerifier`] runs an ordered list of
//! checks; the first one producing a result wins, and a record that makes it
//! through all of them has passed.
//!
//! Git failures while computing diffs become `failed` results. Only
//! [`RepositoryError::IncompatibleOperation`] escapes as an error: it means
//! the records and the repository mode do not fit together at all.

pub mod changes;
pub mod files;
pub mod repos;
pub mod result;

pub use changes::ChangesVerifier;
pub use files::FilesVerifier;
pub use repos::ReposVerifier;
pub use result::ResultVerifier;

use crate::repository::{shorten_sha1, RepositoryError, RepositoryHandle, RepositoryResult};
use mtr_model::{TestRecord, VerificationResult};
use std::collections::HashSet;

/// Revision every declared commit is compared against
pub const HEAD: &str = "HEAD";

/// Outcome of a single check: `None` lets the next check run.
pub type CheckResult = RepositoryResult<Option<VerificationResult>>;

/// A single verification step
pub trait Verifier {
    fn verify(&self) -> CheckResult;
}

type Check<'a> = fn(&TestRecordVerifier<'a>) -> CheckResult;

pub struct TestRecordVerifier<'a> {
    record: &'a TestRecord,
    repository: &'a dyn RepositoryHandle,
    mtr_files: &'a HashSet<String>,
}

impl<'a> TestRecordVerifier<'a> {
    /// `mtr_files` holds the repository-relative paths of every loaded MTR
    /// document; changes to those files never invalidate a record.
    pub fn new(
        record: &'a TestRecord,
        repository: &'a dyn RepositoryHandle,
        mtr_files: &'a HashSet<String>,
    ) -> Self {
        Self {
            record,
            repository,
            mtr_files,
        }
    }

    pub fn verify(&self) -> RepositoryResult<VerificationResult> {
        let checks: [Check<'a>; 2] = [Self::verify_result, Self::verify_repository];

        for check in checks {
            if let Some(result) = check(self)? {
                return Ok(result);
            }
        }

        Ok(VerificationResult::passed())
    }

    fn verify_result(&self) -> CheckResult {
        ResultVerifier::new(self.record).verify()
    }

    fn verify_repository(&self) -> CheckResult {
        if self.record.files.is_some() {
            FilesVerifier::new(self.record, self.repository).verify()
        } else if self.record.repos.is_some() {
            ReposVerifier::new(self.record, self.repository).verify()
        } else {
            ChangesVerifier::new(self.record, self.repository, self.mtr_files).verify()
        }
    }
}

/// `<sha1>..<head>`, both shortened
fn revision_range(repository: &dyn RepositoryHandle, sha1: &str) -> RepositoryResult<String> {
    let head = repository.head()?;
    Ok(format!(
        "{}..{}",
        shorten_sha1(sha1),
        shorten_sha1(&head.sha)
    ))
}

/// Turns a failure to diff into a `failed` result. Incompatible operations
/// are passed through untouched.
fn recover_git_error(
    repository: &dyn RepositoryHandle,
    sha1: &str,
    error: RepositoryError,
) -> CheckResult {
    let message = match error {
        RepositoryError::IncompatibleOperation { .. } => return Err(error),
        RepositoryError::Git(error) => error.message().to_string(),
        other => other.to_string(),
    };

    let head = repository
        .head()
        .map(|head| head.sha)
        .unwrap_or_else(|_| HEAD.to_string());

    Ok(Some(VerificationResult::failed(format!(
        "Unable to diff the revisions: {}..{}: {message}",
        shorten_sha1(sha1),
        shorten_sha1(&head)
    ))))
}
