mod common;

use common::{write, WorkingCopy};
use mtr_auditor::audit::{E_GIT_ERROR, E_NO_MTR_FILES_FOUND};
use mtr_auditor::{check, AuditConfig, CheckOptions};

#[test]
fn test_no_mtr_files() {
    let directory = tempfile::tempdir().unwrap();
    WorkingCopy::init(directory.path());

    let config = AuditConfig::new()
        .with_path(directory.path())
        .with_glob_patterns(["mtr/*.yaml"]);
    let error = check(&config, &CheckOptions::default()).unwrap_err();

    assert_eq!(error.exit_code(), E_NO_MTR_FILES_FOUND);
    assert!(error.to_string().contains("No MTR Files found in"));
}

#[test]
fn test_path_is_not_a_repository() {
    let directory = tempfile::tempdir().unwrap();
    write(
        directory.path(),
        "mtr/REQ_1.yaml",
        "id: REQ_1\nresult: passed\nsha1: abcdef1\n",
    );

    let config = AuditConfig::new().with_glob_patterns(["mtr/*.yaml"]);
    let options = CheckOptions {
        path: Some(directory.path().to_path_buf()),
        ..CheckOptions::default()
    };
    let error = check(&config, &options).unwrap_err();

    assert_eq!(error.exit_code(), E_GIT_ERROR);
}

#[test]
fn test_command_line_path_wins_over_configuration() {
    let directory = tempfile::tempdir().unwrap();
    let copy = WorkingCopy::init(directory.path().join("project"));
    copy.write("src/main.c", "v1\n");
    let sha1 = copy.commit("Initial commit");
    copy.write(
        "mtr/REQ_1.yaml",
        &format!("id: REQ_1\nresult: passed\nsha1: {sha1}\n"),
    );

    let config = AuditConfig::new()
        .with_path(directory.path().join("elsewhere"))
        .with_glob_patterns(["mtr/*.yaml"]);
    let options = CheckOptions {
        path: Some(copy.path().to_path_buf()),
        ..CheckOptions::default()
    };

    let report = check(&config, &options).unwrap();
    assert_eq!(report.path, copy.path());
    assert_eq!(report.exit_code(), 0);
}
