//! CLI smoke tests in demo mode.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn write_test_png(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("scan.png");
    let img = image::GrayImage::from_pixel(64, 64, image::Luma([170u8]));
    img.save(&path).unwrap();
    path
}

#[test]
fn test_process_demo_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_test_png(&dir);

    Command::cargo_bin("ttn")
        .unwrap()
        .args(["process", input.to_str().unwrap(), "--demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("overall_confidence"))
        .stdout(predicate::str::contains("\"degraded\": true"));
}

#[test]
fn test_process_missing_file_fails() {
    Command::cargo_bin("ttn")
        .unwrap()
        .args(["process", "no_such_file.png", "--demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_batch_demo_writes_summary() {
    let dir = tempfile::tempdir().unwrap();
    write_test_png(&dir);
    let pattern = dir.path().join("*.png");
    let output = dir.path().join("summary.csv");

    Command::cargo_bin("ttn")
        .unwrap()
        .args([
            "batch",
            pattern.to_str().unwrap(),
            "--demo",
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 processed, 0 failed"));

    assert!(output.exists());
}
