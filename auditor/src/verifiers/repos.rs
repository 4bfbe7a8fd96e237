use super::{ChangesVerifier, CheckResult, FilesVerifier, Verifier};
use crate::repository::{RepositoryError, RepositoryHandle};
use mtr_model::{Repo, TestRecord, VerificationResult};
use std::collections::HashSet;
use tracing::debug;

/// Verifies every sub-repository a multi-repo record declares.
///
/// Each repo is checked through a proxy record carrying only its commit and
/// files, with the same checks used for whole records. The first repo with a
/// result decides for the record. A repo that cannot be opened fails the
/// record right away.
pub struct ReposVerifier<'a> {
    record: &'a TestRecord,
    repository: &'a dyn RepositoryHandle,
}

impl<'a> ReposVerifier<'a> {
    pub fn new(record: &'a TestRecord, repository: &'a dyn RepositoryHandle) -> Self {
        Self { record, repository }
    }

    fn verify_repo(&self, repo: &Repo) -> CheckResult {
        let repository = match self.repository.repository(&repo.path) {
            Ok(repository) => repository,
            Err(error @ RepositoryError::NotARepository { .. }) => {
                return Ok(Some(VerificationResult::failed(error.to_string())))
            }
            Err(error) => return Err(error),
        };

        debug!("Verifying repository {} at {}", repo.path, repo.sha1);
        let proxy = TestRecord::proxy(repo.sha1.clone(), repo.files.clone());

        let no_mtr_files = HashSet::new();

        if proxy.files.is_some() {
            FilesVerifier::new(&proxy, &*repository).verify()
        } else {
            ChangesVerifier::new(&proxy, &*repository, &no_mtr_files).verify()
        }
    }
}

impl Verifier for ReposVerifier<'_> {
    fn verify(&self) -> CheckResult {
        for repo in self.record.repos.iter().flatten() {
            if let Some(result) = self.verify_repo(repo)? {
                return Ok(Some(result));
            }
        }

        Ok(None)
    }
}
