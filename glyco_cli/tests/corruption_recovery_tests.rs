//! Recovery tests for damaged reading stores.
//!
//! A crash mid-append or a hand-edited store must not stop the CLI from
//! listing or reporting on the readings that are still intact.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("glyco"))
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

const VALID_LINE: &str = r#"{"id":"00000000-0000-0000-0000-000000000001","level":110.0,"unit":"mg/dL","context":"Before Dinner","created_at":"2024-05-10T18:00:00Z"}"#;

#[test]
fn test_partial_last_line() {
    let temp_dir = setup_test_dir();
    let store_path = temp_dir.path().join("readings.jsonl");

    // Valid line followed by a write cut short by a crash
    let mut file = fs::File::create(&store_path).unwrap();
    writeln!(file, "{}", VALID_LINE).unwrap();
    write!(file, r#"{{"id":"partial"#).unwrap();
    drop(file);

    cli()
        .arg("list")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Showing 1 readings"))
        .stdout(predicate::str::contains("Before Dinner"));
}

#[test]
fn test_append_after_partial_line() {
    let temp_dir = setup_test_dir();
    let store_path = temp_dir.path().join("readings.jsonl");
    fs::write(&store_path, format!("{}\n{{\"id\":\"partial\"\n", VALID_LINE)).unwrap();

    cli()
        .arg("add")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .args(["--level", "130", "--context", "Bedtime"])
        .assert()
        .success();

    let output = cli()
        .arg("list")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let records: Vec<serde_json::Value> = serde_json::from_slice(&output).unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn test_wrong_shape_lines_are_skipped() {
    let temp_dir = setup_test_dir();
    let store_path = temp_dir.path().join("readings.jsonl");
    let content = [
        VALID_LINE,
        r#"{"id":"00000000-0000-0000-0000-000000000002","level":"high","unit":"mg/dL","context":"Fasting","created_at":"2024-05-10T07:00:00Z"}"#,
        r#"[1, 2, 3]"#,
        "",
    ]
    .join("\n");
    fs::write(&store_path, content).unwrap();

    cli()
        .arg("stats")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Readings: 1"))
        .stdout(predicate::str::contains("Average Level: 110"));
}

#[test]
fn test_empty_store_file() {
    let temp_dir = setup_test_dir();
    fs::write(temp_dir.path().join("readings.jsonl"), "").unwrap();

    cli()
        .arg("list")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No readings logged yet"));
}

#[test]
fn test_report_with_corrupt_store() {
    let temp_dir = setup_test_dir();
    let store_path = temp_dir.path().join("readings.jsonl");
    fs::write(&store_path, format!("not json\n{}\n", VALID_LINE)).unwrap();
    let output = temp_dir.path().join("report.pdf");

    cli()
        .arg("report")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .arg("--no-charts")
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let text = String::from_utf8_lossy(&fs::read(&output).unwrap()).into_owned();
    assert!(text.contains("(110 mg/dL) Tj"));
}

#[test]
fn test_invalid_utf8_line_is_skipped() {
    let temp_dir = setup_test_dir();
    let store_path = temp_dir.path().join("readings.jsonl");

    let mut content = Vec::new();
    content.extend_from_slice(VALID_LINE.as_bytes());
    content.extend_from_slice(b"\n{\"id\": \"caf\xc3\n");
    fs::write(&store_path, content).unwrap();

    cli()
        .arg("add")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .args(["--level", "130", "--context", "After Dinner"])
        .assert()
        .success();

    cli()
        .arg("list")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Showing 2 readings"));
}
