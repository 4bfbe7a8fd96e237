//! Batch verification of validated records

use crate::repository::{RepositoryError, RepositoryHandle};
use crate::resolver::relative_path;
use crate::verifiers::TestRecordVerifier;
use chrono::{DateTime, TimeDelta, Utc};
use mtr_model::{TestRecord, VerificationResult, VerificationResultError};
use std::collections::HashSet;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum VerifierError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Timestamps(#[from] VerificationResultError),
}

pub type VerifierResult<T> = Result<T, VerifierError>;

pub struct Verifier<'a> {
    repository: &'a dyn RepositoryHandle,
}

impl<'a> Verifier<'a> {
    pub fn new(repository: &'a dyn RepositoryHandle) -> Self {
        Self { repository }
    }

    /// Verifies the records one after the other and attaches the outcome to
    /// each of them. Stops at the first incompatible repository operation.
    pub fn verify(&self, records: &mut [TestRecord]) -> VerifierResult<()> {
        info!("Verifying MTR files...");

        let mtr_files = self.mtr_files(records);
        for record in records.iter_mut() {
            info!("Verifying {}", record.source_file.display());

            let started_at = Utc::now();
            let result = TestRecordVerifier::new(record, self.repository, &mtr_files).verify()?;
            let finished_at = Utc::now();

            let result = timestamped(result, started_at, finished_at)?;
            info!("{}", result.log_message());
            record.verification_result = Some(result);
        }

        Ok(())
    }

    /// Repository-relative paths of the documents the records came from
    fn mtr_files(&self, records: &[TestRecord]) -> HashSet<String> {
        records
            .iter()
            .map(|record| relative_path(self.repository.path(), &record.source_file))
            .collect()
    }
}

/// Attaches the timestamps, keeping the end strictly after the start even
/// when the clock did not advance.
fn timestamped(
    mut result: VerificationResult,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
) -> VerifierResult<VerificationResult> {
    let finished_at = finished_at.max(started_at + TimeDelta::microseconds(1));

    result.set_started_at(started_at)?;
    result.set_finished_at(finished_at)?;
    Ok(result)
}
