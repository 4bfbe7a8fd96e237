use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationResultError {
    #[error("Invalid status {status}. Valid statuses are: passed, skipped, failed")]
    InvalidStatus { status: String },

    #[error("A reason is required for a verification result with status {status}")]
    MissingReason { status: VerificationStatus },

    #[error("started_at must be smaller than finished_at")]
    StartedAfterFinish,

    #[error("finished_at must be greater than started_at")]
    FinishedBeforeStart,

    #[error("Both started_at and finished_at must be set in order to calculate the runtime")]
    MissingTimestamp,
}

pub type VerificationResultResult<T> = Result<T, VerificationResultError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Passed,
    Skipped,
    Failed,
}

impl VerificationStatus {
    pub const ALL: [VerificationStatus; 3] = [
        VerificationStatus::Passed,
        VerificationStatus::Skipped,
        VerificationStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Passed => "passed",
            VerificationStatus::Skipped => "skipped",
            VerificationStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationStatus {
    type Err = VerificationResultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| VerificationResultError::InvalidStatus {
                status: s.to_string(),
            })
    }
}

/// Outcome of verifying one test record
///
/// The timestamps are kept ordered: once one of them is set, the other one can
/// only be set to a value on the correct side of it. The runtime is derived
/// from both and cached until either timestamp changes.
#[derive(Debug, Clone)]
pub struct VerificationResult {
    status: VerificationStatus,
    reason: Option<String>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    runtime: Cell<Option<TimeDelta>>,
}

impl VerificationResult {
    /// Creates a result. `reason` is mandatory for anything but `passed`.
    pub fn new(
        status: VerificationStatus,
        reason: Option<String>,
    ) -> VerificationResultResult<Self> {
        check_reason(status, reason.as_deref())?;

        Ok(Self {
            status,
            reason,
            started_at: None,
            finished_at: None,
            runtime: Cell::new(None),
        })
    }

    pub fn passed() -> Self {
        Self {
            status: VerificationStatus::Passed,
            reason: None,
            started_at: None,
            finished_at: None,
            runtime: Cell::new(None),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: VerificationStatus::Skipped,
            reason: Some(reason.into()),
            ..Self::passed()
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: VerificationStatus::Failed,
            reason: Some(reason.into()),
            ..Self::passed()
        }
    }

    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn is_passed(&self) -> bool {
        self.status == VerificationStatus::Passed
    }

    pub fn is_skipped(&self) -> bool {
        self.status == VerificationStatus::Skipped
    }

    pub fn is_failed(&self) -> bool {
        self.status == VerificationStatus::Failed
    }

    pub fn set_status(&mut self, status: VerificationStatus) -> VerificationResultResult<()> {
        check_reason(status, self.reason.as_deref())?;
        self.status = status;
        Ok(())
    }

    /// Parses and assigns a status given by name.
    pub fn set_status_str(&mut self, status: &str) -> VerificationResultResult<()> {
        self.set_status(status.parse()?)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn set_started_at(&mut self, time: DateTime<Utc>) -> VerificationResultResult<()> {
        if self.finished_at.is_some_and(|finished_at| time >= finished_at) {
            return Err(VerificationResultError::StartedAfterFinish);
        }

        self.runtime.set(None);
        self.started_at = Some(time);
        Ok(())
    }

    pub fn set_finished_at(&mut self, time: DateTime<Utc>) -> VerificationResultResult<()> {
        if self.started_at.is_some_and(|started_at| time <= started_at) {
            return Err(VerificationResultError::FinishedBeforeStart);
        }

        self.runtime.set(None);
        self.finished_at = Some(time);
        Ok(())
    }

    /// Runtime of the verification, `None` while a timestamp is missing.
    pub fn runtime(&self) -> Option<TimeDelta> {
        self.try_runtime().ok()
    }

    pub fn try_runtime(&self) -> VerificationResultResult<TimeDelta> {
        if let Some(runtime) = self.runtime.get() {
            return Ok(runtime);
        }

        let (Some(started_at), Some(finished_at)) = (self.started_at, self.finished_at) else {
            return Err(VerificationResultError::MissingTimestamp);
        };

        let runtime = finished_at - started_at;
        self.runtime.set(Some(runtime));
        Ok(runtime)
    }

    /// Runtime in (fractional) seconds
    pub fn runtime_seconds(&self) -> Option<f64> {
        self.runtime().map(|runtime| {
            runtime.num_seconds() as f64 + f64::from(runtime.subsec_nanos()) / 1_000_000_000.0
        })
    }

    /// One-line summary used when logging the outcome of a verification
    pub fn log_message(&self) -> String {
        match self.status {
            VerificationStatus::Passed => "✔ PASSED".to_string(),
            VerificationStatus::Skipped => {
                format!("⚠ SKIPPED {}", self.reason.as_deref().unwrap_or_default())
            }
            VerificationStatus::Failed => format!(
                "✘ FAILED {}",
                self.reason.as_deref().unwrap_or("Unknown reason")
            ),
        }
    }
}

fn check_reason(status: VerificationStatus, reason: Option<&str>) -> VerificationResultResult<()> {
    if status != VerificationStatus::Passed && reason.is_none() {
        return Err(VerificationResultError::MissingReason { status });
    }
    Ok(())
}
