use super::{CheckResult, Verifier};
use mtr_model::{TestRecord, VerificationResult};

/// Fails every record whose tester did not report it as passed.
pub struct ResultVerifier<'a> {
    record: &'a TestRecord,
}

impl<'a> ResultVerifier<'a> {
    pub fn new(record: &'a TestRecord) -> Self {
        Self { record }
    }
}

impl Verifier for ResultVerifier<'_> {
    fn verify(&self) -> CheckResult {
        if self.record.passed() {
            return Ok(None);
        }

        Ok(Some(VerificationResult::failed(format!(
            "'result' field has the status '{}'",
            self.record.result
        ))))
    }
}
