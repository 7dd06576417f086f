//! Concurrency tests for the glyco binary.
//!
//! These tests verify that multiple processes can safely append to the
//! reading store at the same time (file locking).

use assert_cmd::Command;
use std::thread;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("glyco"))
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_concurrent_adds() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                cli()
                    .arg("add")
                    .arg("--data-dir")
                    .arg(&data_dir)
                    .args(["--level", &(100 + i).to_string(), "--context", "Bedtime"])
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("add thread panicked");
    }

    // Every line must be complete and parseable
    let content = std::fs::read_to_string(data_dir.join("readings.jsonl")).unwrap();
    let lines: Vec<_> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(lines.len(), 8, "Expected 8 readings, got {}", lines.len());
    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line).expect("complete JSON line");
        assert_eq!(value["context"], "Bedtime");
    }
}

#[test]
fn test_reads_during_writes() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    let writer_dir = data_dir.clone();
    let writer = thread::spawn(move || {
        for level in 90..95 {
            cli()
                .arg("add")
                .arg("--data-dir")
                .arg(&writer_dir)
                .args(["--level", &level.to_string()])
                .assert()
                .success();
        }
    });

    for _ in 0..5 {
        cli()
            .arg("list")
            .arg("--data-dir")
            .arg(&data_dir)
            .args(["--format", "json"])
            .assert()
            .success();
    }

    writer.join().expect("writer thread panicked");

    let content = std::fs::read_to_string(data_dir.join("readings.jsonl")).unwrap();
    assert_eq!(content.lines().count(), 5);
}
