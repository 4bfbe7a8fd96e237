use super::{recover_git_error, revision_range, CheckResult, Verifier, HEAD};
use crate::repository::RepositoryHandle;
use mtr_model::{TestRecord, VerificationResult};
use std::collections::HashSet;

/// Skips a record when anything in the repository changed since the recorded
/// commit, ignoring changes to the MTR documents themselves.
///
/// Only the first offending file, in the order git lists the diff, is named in
/// the reason.
pub struct ChangesVerifier<'a> {
    record: &'a TestRecord,
    repository: &'a dyn RepositoryHandle,
    mtr_files: &'a HashSet<String>,
}

impl<'a> ChangesVerifier<'a> {
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

    fn sha1(&self) -> &str {
        self.record.sha1.as_deref().unwrap_or_default()
    }

    fn find_changes(&self) -> CheckResult {
        let diff = self.repository.diff(self.sha1(), HEAD)?;
        if diff.is_empty() {
            return Ok(None);
        }

        let Some(file) = diff
            .changed_files()
            .find(|file| !self.mtr_files.contains(*file))
        else {
            return Ok(None);
        };

        Ok(Some(VerificationResult::skipped(format!(
            "Changes detected in the repository: {} # -- {file}",
            revision_range(self.repository, self.sha1())?
        ))))
    }
}

impl Verifier for ChangesVerifier<'_> {
    fn verify(&self) -> CheckResult {
        self.find_changes()
            .or_else(|error| recover_git_error(self.repository, self.sha1(), error))
    }
}
