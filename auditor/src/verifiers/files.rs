use super::{recover_git_error, revision_range, CheckResult, Verifier, HEAD};
use crate::repository::{RepositoryHandle, RepositoryResult};
use mtr_model::{TestRecord, VerificationResult};

/// Skips a record when any of its listed files changed since the recorded
/// commit.
pub struct FilesVerifier<'a> {
    record: &'a TestRecord,
    repository: &'a dyn RepositoryHandle,
}

impl<'a> FilesVerifier<'a> {
    pub fn new(record: &'a TestRecord, repository: &'a dyn RepositoryHandle) -> Self {
        Self { record, repository }
    }

    fn sha1(&self) -> &str {
        self.record.sha1.as_deref().unwrap_or_default()
    }

    fn find_changes(&self) -> CheckResult {
        let mut changes: Vec<&str> = Vec::new();

        for file in self.record.files.iter().flatten() {
            let diff = self.repository.diff_path(self.sha1(), HEAD, file)?;
            if !diff.is_empty() {
                changes.push(file);
            }
        }

        if changes.is_empty() {
            return Ok(None);
        }

        Ok(Some(self.result_from(&changes)?))
    }

    fn result_from(&self, changes: &[&str]) -> RepositoryResult<VerificationResult> {
        Ok(VerificationResult::skipped(format!(
            "Changes detected in listed file(s): {} -- {}",
            revision_range(self.repository, self.sha1())?,
            changes.join(" ")
        )))
    }
}

impl Verifier for FilesVerifier<'_> {
    fn verify(&self) -> CheckResult {
        self.find_changes()
            .or_else(|error| recover_git_error(self.repository, self.sha1(), error))
    }
}
