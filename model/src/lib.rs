pub mod record;
pub mod validators;
pub mod verification;

pub use record::{RawRepo, RawTestRecord, RecordResult, Repo, TestRecord};
pub use validators::{
    DataValidator, FieldValidator, FormatError, RepoValidator, TestRecordValidator,
    ValidationError, ValidationResult, ValueType,
};
pub use verification::{
    VerificationResult, VerificationResultError, VerificationResultResult, VerificationStatus,
};

pub mod prelude {
    pub use crate::record::*;
    pub use crate::validators::{DataValidator, FormatError, ValidationError, ValidationResult};
    pub use crate::verification::*;
}
