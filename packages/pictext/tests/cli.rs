//! Integration tests for the CLI commands

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_version_command() {
    let mut cmd = cargo_bin_cmd!("pictext");
    cmd.arg("version");

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("pictext "));
}

#[test]
fn test_version_flag() {
    let mut cmd = cargo_bin_cmd!("pictext");
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("pictext "));
}

#[test]
fn test_labels_default_table() {
    let mut cmd = cargo_bin_cmd!("pictext");
    cmd.arg("labels").env_remove("PICTEXT_CATEGORIES");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"Graph\""))
        .stdout(predicate::str::contains("a sentence including Hangul"))
        .stdout(predicate::str::contains("formula including fraction or symbols"));
}

#[test]
fn test_labels_custom_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("categories.json");
    std::fs::write(&path, r#"{"Text": ["a handwritten note"]}"#).unwrap();

    let mut cmd = cargo_bin_cmd!("pictext");
    cmd.arg("labels").arg("--categories").arg(&path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("a handwritten note"))
        .stdout(predicate::str::contains("bar graph").not());
}

#[test]
fn test_labels_rejects_empty_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("categories.json");
    std::fs::write(&path, "{}").unwrap();

    let mut cmd = cargo_bin_cmd!("pictext");
    cmd.arg("labels").arg("--categories").arg(&path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no labels"));
}

#[test]
fn test_convert_without_gemini_key_fails_fast() {
    let mut cmd = cargo_bin_cmd!("pictext");
    cmd.arg("convert")
        .env_remove("GOOGLE_API_KEY")
        .env_remove("OCR_ENGINE")
        .write_stdin("iVBORw0KGgo=");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("GOOGLE_API_KEY"));
}

#[test]
fn test_input_and_image_conflict() {
    let mut cmd = cargo_bin_cmd!("pictext");
    cmd.args(["convert", "--input", "a.b64", "--image", "a.png"]);

    cmd.assert().failure();
}
