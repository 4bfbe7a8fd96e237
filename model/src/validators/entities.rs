//! Entity validators
//!
//! Turn raw records and repos into their typed counterparts. The first
//! violated rule wins; failures are never accumulated.

use super::fields::{
    DescriptionValidator, FieldValidator, FilesValidator, IdValidator, MetaDataFieldValidator,
    PathValidator, ReposValidator, ResultValidator, Sha1Validator, TextValidator,
};
use super::{ValidationError, ValidationResult};
use crate::record::{RawRepo, RawTestRecord, Repo, TestRecord};
use serde_yaml::Value;

pub struct RepoValidator<'a> {
    repo: &'a RawRepo,
}

impl<'a> RepoValidator<'a> {
    pub fn new(repo: &'a RawRepo) -> Self {
        Self { repo }
    }

    pub fn validate(&self) -> ValidationResult<Repo> {
        let sha1 = Sha1Validator.validate("repos[sha1]", self.repo.sha1.as_ref())?;
        let path = PathValidator.validate("repos[path]", self.repo.path.as_ref())?;
        let files = FilesValidator.validate("repos[files]", self.repo.files.as_ref())?;

        Ok(Repo { path, sha1, files })
    }
}

pub struct TestRecordValidator<'a> {
    record: &'a RawTestRecord,
}

impl<'a> TestRecordValidator<'a> {
    pub fn new(record: &'a RawTestRecord) -> Self {
        Self { record }
    }

    /// Validates the raw record and builds the typed [`TestRecord`].
    ///
    /// Order matters: `files`/`repos` exclusivity is checked first, then
    /// `repos`/`sha1`. `sha1` is only required once `repos` turned out to be
    /// absent, so an empty `repos` list still allows a standalone `sha1`.
    pub fn validate(&self) -> ValidationResult<TestRecord> {
        let record = self.record;

        self.repos_xor_files()?;
        let (repos, sha1) = self.repos_xor_sha1()?;

        let id = IdValidator.validate("id", record.id.as_ref())?;
        let description = DescriptionValidator.validate("description", record.description.as_ref())?;

        let meta_data = MetaDataFieldValidator;
        let name = meta_data.validate("name", record.name.as_ref())?;
        let test_method = meta_data.validate("test_method", record.test_method.as_ref())?;
        let tc_derivation_method =
            meta_data.validate("tc_derivation_method", record.tc_derivation_method.as_ref())?;

        let files = FilesValidator.validate("files", record.files.as_ref())?;
        let result = ResultValidator.validate("result", record.result.as_ref())?;

        let review_status = TextValidator.validate("review_status", record.review_status.as_ref())?;
        let review_comments =
            TextValidator.validate("review_comments", record.review_comments.as_ref())?;
        let findings = TextValidator.validate("findings", record.findings.as_ref())?;

        Ok(TestRecord {
            id,
            result,
            sha1,
            name,
            description,
            files,
            repos,
            review_status,
            review_comments,
            findings,
            test_method,
            tc_derivation_method,
            source_file: record.source_file.clone(),
            verification_result: None,
        })
    }

    fn repos_xor_files(&self) -> ValidationResult<()> {
        if self.record.files.is_some() && self.record.repos.is_some() {
            return Err(ValidationError::MutuallyExclusive {
                id: self.id_label(),
                first: "files",
                second: "repos",
            });
        }
        Ok(())
    }

    fn repos_xor_sha1(&self) -> ValidationResult<(Option<Vec<Repo>>, Option<String>)> {
        let repos = ReposValidator.validate("repos", self.record.repos.as_ref())?;

        if repos.is_none() {
            let sha1 = Sha1Validator.validate("sha1", self.record.sha1.as_ref())?;
            return Ok((None, Some(sha1)));
        }

        if self.record.sha1.is_some() {
            return Err(ValidationError::MutuallyExclusive {
                id: self.id_label(),
                first: "repos",
                second: "sha1",
            });
        }

        Ok((repos, None))
    }

    /// The record's ID as written by the author, for error messages.
    fn id_label(&self) -> String {
        match &self.record.id {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Sequence(ids)) => ids
                .iter()
                .map(|id| match id {
                    Value::String(id) => id.clone(),
                    other => format!("{other:?}"),
                })
                .collect::<Vec<_>>()
                .join(", "),
            Some(other) => format!("{other:?}"),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordResult;
    use serde_yaml::Mapping;

    fn raw(yaml: &str) -> RawTestRecord {
        let mapping: Mapping = serde_yaml::from_str(yaml).unwrap();
        RawTestRecord::from_mapping(&mapping).with_source_file("mtr/REQ_1.yaml")
    }

    #[test]
    fn test_repo_validator() {
        let mapping: Mapping =
            serde_yaml::from_str("path: libs/core\nsha1: abcdef1\nfiles: [a.c, b.c]").unwrap();
        let repo = RepoValidator::new(&RawRepo::from_mapping(&mapping))
            .validate()
            .unwrap();

        assert_eq!(repo.path, "libs/core");
        assert_eq!(repo.sha1, "abcdef1");
        assert_eq!(repo.files, Some(vec!["a.c".to_string(), "b.c".to_string()]));
    }

    #[test]
    fn test_repo_validator_checks_sha1_first() {
        let repo = RawRepo::default();
        let error = RepoValidator::new(&repo).validate().unwrap_err();
        assert_eq!(error.to_string(), "Missing required key: repos[sha1]");
    }

    #[test]
    fn test_valid_record() {
        let record = TestRecordValidator::new(&raw(
            "id: [REQ_1, REQ_2]\nresult: PASSED\nsha1: abcdef1\nname: Jane\n\
             files: src/main.cpp\ntest_method: []\nfindings: no findings\n",
        ))
        .validate()
        .unwrap();

        assert_eq!(record.id, vec!["REQ_1", "REQ_2"]);
        assert_eq!(record.result, RecordResult::Passed);
        assert_eq!(record.sha1.as_deref(), Some("abcdef1"));
        assert_eq!(record.name, Some(vec!["Jane".to_string()]));
        assert_eq!(record.files, Some(vec!["src/main.cpp".to_string()]));
        assert_eq!(record.test_method, None);
        assert_eq!(record.findings.as_deref(), Some("no findings"));
        assert_eq!(record.source_file.to_str(), Some("mtr/REQ_1.yaml"));
        assert!(record.verification_result.is_none());
    }

    #[test]
    fn test_files_and_repos_are_exclusive() {
        let error = TestRecordValidator::new(&raw(
            "id: REQ_1\nresult: passed\nfiles: a.c\nrepos: [{path: a, sha1: abcdef1}]\n",
        ))
        .validate()
        .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Invalid MTR: REQ_1. Either 'files' or 'repos' should be provided, not both"
        );
    }

    #[test]
    fn test_files_and_empty_repos_are_exclusive() {
        let error = TestRecordValidator::new(&raw(
            "id: REQ_1\nresult: passed\nsha1: abcdef1\nfiles: a.c\nrepos: []\n",
        ))
        .validate()
        .unwrap_err();

        assert!(matches!(
            error,
            ValidationError::MutuallyExclusive { first: "files", .. }
        ));
    }

    #[test]
    fn test_repos_and_sha1_are_exclusive() {
        let error = TestRecordValidator::new(&raw(
            "id: REQ_1\nresult: passed\nsha1: abcdef1\nrepos: {path: a, sha1: abcdef1}\n",
        ))
        .validate()
        .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Invalid MTR: REQ_1. Either 'repos' or 'sha1' should be provided, not both"
        );
    }

    #[test]
    fn test_repos_without_sha1() {
        let record = TestRecordValidator::new(&raw(
            "id: REQ_1\nresult: passed\nrepos:\n  - path: libs/a\n    sha1: abcdef1\n",
        ))
        .validate()
        .unwrap();

        assert_eq!(record.sha1, None);
        let repos = record.repos.unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].path, "libs/a");
    }

    #[test]
    fn test_empty_repos_with_sha1() {
        let record = TestRecordValidator::new(&raw(
            "id: REQ_1\nresult: passed\nsha1: abcdef1\nrepos: []\n",
        ))
        .validate()
        .unwrap();

        assert!(record.repos.is_none());
        assert_eq!(record.sha1.as_deref(), Some("abcdef1"));
    }

    #[test]
    fn test_sha1_required_without_repos() {
        let error = TestRecordValidator::new(&raw("id: REQ_1\nresult: passed\n"))
            .validate()
            .unwrap_err();
        assert_eq!(error.to_string(), "Missing required key: sha1");
    }

    #[test]
    fn test_first_failure_wins() {
        // Both the ID and the result are invalid; the ID is checked first.
        let error = TestRecordValidator::new(&raw(
            "id: REQ_1 REQ_2\nresult: maybe\nsha1: abcdef1\n",
        ))
        .validate()
        .unwrap_err();

        assert!(matches!(error, ValidationError::DisallowedCharacter { .. }));
    }

    #[test]
    fn test_invalid_result() {
        let error = TestRecordValidator::new(&raw("id: REQ_1\nresult: maybe\nsha1: abcdef1\n"))
            .validate()
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid value for key result: 'maybe'. Valid values are passed, failed"
        );
    }
}
