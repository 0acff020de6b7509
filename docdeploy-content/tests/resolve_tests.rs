use std::fs;
use std::path::Path;

use docdeploy_content::{resolve, shell::EOL, ContentError};
use docdeploy_core::{Document, DocumentConfig, DocumentFormat};
use tempfile::TempDir;

fn load(dir: &Path, json: &str) -> Document {
    let config: DocumentConfig = serde_json::from_str(json).expect("descriptor");
    Document::from_config(config, "demo", dir)
}

#[test]
fn shell_flag_wins_over_inline_content() {
    let dir = TempDir::new().expect("dir");
    fs::write(dir.path().join("run.sh"), format!("echo from-script{EOL}uptime")).expect("write");

    let doc = load(
        dir.path(),
        r#"{
            "format": "SHELL",
            "file": "run.sh",
            "content": {"schemaVersion": "0.3", "mainSteps": [{"action": "aws:sleep", "name": "Inline"}]}
        }"#,
    );
    let resolved = resolve(&doc).expect("resolve");

    assert_eq!(resolved.format, DocumentFormat::Json);
    let json: serde_json::Value = serde_json::from_str(&resolved.payload).expect("json");
    assert_eq!(json["schemaVersion"], "2.2");
    assert_eq!(json["mainSteps"][0]["action"], "aws:runShellScript");
    assert_eq!(
        json["mainSteps"][0]["inputs"]["runCommand"],
        serde_json::json!(["echo from-script", "uptime"])
    );
}

#[test]
fn sh_file_reference_is_wrapped() {
    let dir = TempDir::new().expect("dir");
    fs::write(dir.path().join("script.sh"), "df -h").expect("write");

    let doc = load(
        dir.path(),
        r#"{"file": "script.sh", "workingDirectory": "/opt", "tags": {"env": "prod"}}"#,
    );
    let resolved = resolve(&doc).expect("resolve");
    let json: serde_json::Value = serde_json::from_str(&resolved.payload).expect("json");

    let steps = json["mainSteps"].as_array().expect("steps");
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0]["inputs"]["workingDirectory"], "/opt");
    assert_eq!(steps[0]["inputs"]["runCommand"], serde_json::json!(["df -h"]));
}

#[test]
fn yaml_file_is_submitted_verbatim() {
    let dir = TempDir::new().expect("dir");
    let body = "schemaVersion: '2.2'\nmainSteps: []\n";
    fs::write(dir.path().join("doc.yaml"), body).expect("write");

    let doc = load(dir.path(), r#"{"file": "doc.yaml"}"#);
    let resolved = resolve(&doc).expect("resolve");
    assert_eq!(resolved.format, DocumentFormat::Yaml);
    assert_eq!(resolved.payload, body);
}

#[test]
fn unsupported_extension_is_checked_before_reading() {
    let dir = TempDir::new().expect("dir");
    let doc = load(dir.path(), r#"{"file": "missing.toml"}"#);
    let err = resolve(&doc).unwrap_err();
    assert!(matches!(err, ContentError::UnsupportedExtension { .. }), "got: {err}");
}

#[test]
fn missing_text_file_is_read_error() {
    let dir = TempDir::new().expect("dir");
    let doc = load(dir.path(), r#"{"file": "missing.txt"}"#);
    let err = resolve(&doc).unwrap_err();
    assert!(matches!(err, ContentError::Read { .. }), "got: {err}");
}
