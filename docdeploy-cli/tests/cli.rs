use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ISOLATED_VARS: &[&str] = &[
    "AWS_ACCOUNT_ID",
    "AWS_PROFILE",
    "AWS_REGION",
    "AWS_DEFAULT_REGION",
    "SSM_ENDPOINT",
    "SSM_DOCUMENT_PATH",
    "SSM_DOCUMENT_ENV",
    "SSM_DOCUMENT_CONFIG_FILE",
    "SSM_DOCUMENT_CONFIG_PARSER",
];

/// `docdeploy` running in `dir` with none of its environment variables set.
fn docdeploy(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("docdeploy").expect("binary");
    cmd.current_dir(dir);
    for var in ISOLATED_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn write_descriptor(root: &Path, dir: &str, name: &str) {
    let dir = root.join(dir);
    std::fs::create_dir_all(&dir).expect("mkdir");
    std::fs::write(dir.join("script.sh"), "echo hello").expect("script");
    std::fs::write(
        dir.join("document.yml"),
        format!("name: {name}\nfile: script.sh\ntags:\n  env: test\n"),
    )
    .expect("descriptor");
}

#[test]
fn help_lists_commands_and_aliases() {
    let dir = TempDir::new().expect("dir");
    docdeploy(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("--config-parser"));
}

#[test]
fn help_says_profile_is_not_used_for_signing() {
    let dir = TempDir::new().expect("dir");
    docdeploy(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--profile"))
        .stdout(predicate::str::contains("recorded only; requests are unsigned"));
}

#[test]
fn deploy_without_identity_fails_before_loading() {
    let dir = TempDir::new().expect("dir");
    docdeploy(dir.path())
        .args(["deploy", "--all", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No valid AWS credentials found"));
}

#[test]
fn account_id_can_come_from_env_file() {
    let dir = TempDir::new().expect("dir");
    std::fs::write(dir.path().join(".env.staging"), "AWS_ACCOUNT_ID=123456789012\n").expect("env");

    docdeploy(dir.path())
        .env("SSM_DOCUMENT_ENV", "staging")
        .args(["deploy", "--all", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No valid AWS credentials found").not())
        .stderr(predicate::str::contains("failed to load document descriptors"));
}

#[test]
fn env_file_inline_comments_do_not_leak_into_region() {
    let dir = TempDir::new().expect("dir");
    std::fs::write(
        dir.path().join(".env"),
        "AWS_ACCOUNT_ID=123456789012 # ops\nAWS_REGION=eu-west-1 # primary\n",
    )
    .expect("env");

    docdeploy(dir.path())
        .args(["deploy", "--all", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to configure registry client").not())
        .stderr(predicate::str::contains("failed to load document descriptors"));
}

#[test]
fn malformed_env_file_is_reported() {
    let dir = TempDir::new().expect("dir");
    std::fs::write(dir.path().join(".env"), "not a pair\n").expect("env");

    docdeploy(dir.path())
        .args(["--account-id", "123456789012", "deploy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load env file"));
}

#[test]
fn zero_parallels_is_rejected() {
    let dir = TempDir::new().expect("dir");
    docdeploy(dir.path())
        .args(["--account-id", "123456789012", "up", "--parallels", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--parallels must be a positive integer"));
}

#[test]
fn unknown_parser_is_rejected() {
    let dir = TempDir::new().expect("dir");
    write_descriptor(dir.path(), "a", "alpha");
    docdeploy(dir.path())
        .args(["--account-id", "123456789012", "--config-parser", "toml", "deploy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parser toml not supported"));
}

#[test]
fn declined_confirmation_skips_remove() {
    let dir = TempDir::new().expect("dir");
    write_descriptor(dir.path(), "a", "alpha");
    write_descriptor(dir.path(), "b", "beta");

    docdeploy(dir.path())
        .args(["--account-id", "123456789012", "down", "--all"])
        .write_stdin("n\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Are you sure you want to remove 2 documents?"))
        .stderr(predicate::str::contains(
            "Not confirmed documents remove, skip operation",
        ));
}

#[test]
fn empty_selection_is_an_error() {
    let dir = TempDir::new().expect("dir");
    write_descriptor(dir.path(), "a", "alpha");
    write_descriptor(dir.path(), "b", "beta");

    docdeploy(dir.path())
        .args(["--account-id", "123456789012", "deploy"])
        .write_stdin("\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("alpha").and(predicate::str::contains("beta")))
        .stderr(predicate::str::contains("No documents selected"));
}

#[test]
fn unreachable_registry_reports_aggregate_failure() {
    let dir = TempDir::new().expect("dir");
    write_descriptor(dir.path(), "a", "alpha");

    docdeploy(dir.path())
        .args([
            "--account-id",
            "123456789012",
            "--endpoint",
            "http://127.0.0.1:9",
            "deploy",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 1 documents failed deploy"));
}
