use mtr_model::{DataValidator, FormatError, RecordResult, TestRecord};
use serde_yaml::Value;

const SHA1: &str = "4a8a08f09d37b73795649038408b5f33";
const SOURCE_FILE: &str = "/workspace/project/mtr/ESR_REQ_1030.yaml";

fn validate(yaml: &str) -> Result<TestRecord, FormatError> {
    let data: Value = serde_yaml::from_str(yaml).expect("test YAML must parse");
    DataValidator::new(data, SOURCE_FILE).validate()
}

#[test]
fn test_complete_record() {
    let record = validate(&format!(
        r#"
id: ESR_REQ_1030
result: Passed
sha1: {SHA1}
name: [Jane Doe, John Doe]
description: >
  Flash the firmware and reboot the device.
files:
  - src/boot/*.cpp
  - include/boot.h
review_status: reviewed
review_comments: Checked the logs
findings: none worth mentioning
test_method: manual
tc_derivation_method: [requirements analysis]
"#
    ))
    .unwrap();

    assert_eq!(record.id, vec!["ESR_REQ_1030"]);
    assert_eq!(record.result, RecordResult::Passed);
    assert_eq!(record.sha1.as_deref(), Some(SHA1));
    assert_eq!(
        record.name,
        Some(vec!["Jane Doe".to_string(), "John Doe".to_string()])
    );
    assert_eq!(
        record.description.as_deref(),
        Some("Flash the firmware and reboot the device.")
    );
    assert_eq!(
        record.files,
        Some(vec!["src/boot/*.cpp".to_string(), "include/boot.h".to_string()])
    );
    assert!(record.reviewed());
    assert!(record.has_findings());
    assert_eq!(record.test_method, Some(vec!["manual".to_string()]));
    assert_eq!(
        record.tc_derivation_method,
        Some(vec!["requirements analysis".to_string()])
    );
}

#[test]
fn test_files_and_repos_together_fail() {
    let error = validate(
        r#"
id: ESR_REQ_1030
result: passed
files: src/main.cpp
repos:
  - path: libs/core
    sha1: abcdef1
"#,
    )
    .unwrap_err();

    assert!(error.message.contains("'files'"));
    assert!(error.message.contains("'repos'"));
}

#[test]
fn test_repos_and_sha1_together_fail() {
    let error = validate(&format!(
        r#"
id: ESR_REQ_1030
result: passed
sha1: {SHA1}
repos:
  path: libs/core
  sha1: abcdef1
"#
    ))
    .unwrap_err();

    assert_eq!(
        error.message,
        "Invalid MTR: ESR_REQ_1030. Either 'repos' or 'sha1' should be provided, not both"
    );
}

#[test]
fn test_repos_without_sha1_passes() {
    let record = validate(
        r#"
id: [ESR_REQ_1030, ESR_REQ_1031]
result: failed
repos:
  - path: libs/core
    sha1: abcdef1
    files: src/*.c
  - path: libs/net
    sha1: 0123456789abcdef
"#,
    )
    .unwrap();

    assert_eq!(record.result, RecordResult::Failed);
    assert_eq!(record.sha1, None);

    let repos = record.repos.unwrap();
    assert_eq!(repos.len(), 2);
    assert_eq!(repos[0].files, Some(vec!["src/*.c".to_string()]));
    assert_eq!(repos[1].files, None);
}

#[test]
fn test_missing_sha1_without_repos_fails() {
    let error = validate("id: ESR_REQ_1030\nresult: passed\n").unwrap_err();
    assert_eq!(error.message, "Missing required key: sha1");
}

#[test]
fn test_invalid_repo_inside_record_fails() {
    let error = validate(
        r#"
id: ESR_REQ_1030
result: passed
repos:
  - path: libs/core
    sha1: not-a-sha
"#,
    )
    .unwrap_err();

    assert_eq!(
        error.message,
        "Invalid value for key repos[sha1]: 'not-a-sha'. Doesn't seem to be a valid hexadecimal string"
    );
}

#[test]
fn test_non_map_document_fails() {
    let error = validate("- ESR_REQ_1030\n").unwrap_err();
    assert_eq!(
        error.message,
        "Incompatible data structure. Expecting a Map, got a Array"
    );
}
