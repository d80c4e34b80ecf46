//! End-to-end tests for the `stepgate` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn fixture() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/test_pipeline.yaml")
}

fn stepgate(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("stepgate").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_check_valid_pipeline() {
    let home = TempDir::new().unwrap();
    stepgate(home.path())
        .args(["check", fixture()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pipeline is valid"))
        .stdout(predicate::str::contains("nightly-refactor"));
}

#[test]
fn test_check_invalid_pipeline() {
    let home = TempDir::new().unwrap();
    let bad = home.path().join("bad.yaml");
    std::fs::write(&bad, "items: []\n").unwrap();
    stepgate(home.path())
        .args(["check", bad.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one item"));
}

#[test]
fn test_run_then_rerun_skips_everything() {
    let home = TempDir::new().unwrap();
    let state = home.path().join("state.json");
    let state_arg = state.to_str().unwrap();

    stepgate(home.path())
        .args(["run", fixture(), "--approval", "auto-deny", "--state", state_arg])
        .assert()
        .success()
        .stdout(predicate::str::contains("rejected"))
        .stdout(predicate::str::contains("3 decided"));

    let saved: Vec<String> =
        serde_json::from_str(&std::fs::read_to_string(&state).unwrap()).unwrap();
    assert_eq!(saved.len(), 3);

    stepgate(home.path())
        .args(["run", fixture(), "--approval", "auto-approve", "--state", state_arg])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 skipped"));

    stepgate(home.path())
        .args(["status", fixture(), "--state", state_arg])
        .assert()
        .success()
        .stdout(predicate::str::contains("All 3 items resolved"));
}

#[test]
fn test_run_writes_journal() {
    let home = TempDir::new().unwrap();
    let state = home.path().join("state.json");

    stepgate(home.path())
        .args([
            "run",
            fixture(),
            "--approval",
            "auto-approve",
            "--state",
            state.to_str().unwrap(),
            "--run-id",
            "run-e2e",
        ])
        .assert()
        .success();

    let journal = home.path().join(".stepgate/logs/run-e2e.jsonl");
    let content = std::fs::read_to_string(&journal).unwrap();
    assert_eq!(content.lines().count(), 3);

    stepgate(home.path())
        .args(["log", "--run", "run-e2e", "--summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("run-e2e"));
}

#[test]
fn test_unknown_approval_mode() {
    let home = TempDir::new().unwrap();
    stepgate(home.path())
        .args(["run", fixture(), "--approval", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown approval mode"));
}

#[test]
fn test_file_presentation_raises_log_level() {
    let home = TempDir::new().unwrap();
    let pipeline = home.path().join("logged.yaml");
    std::fs::write(
        &pipeline,
        "settings:\n  presentation: log\nitems:\n  - { key: a, agent_id: x, agent_name: X }\n",
    )
    .unwrap();
    let state = home.path().join("state.json");

    stepgate(home.path())
        .args([
            "run",
            pipeline.to_str().unwrap(),
            "--approval",
            "auto-approve",
            "--no-journal",
            "--state",
            state.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("item resolved"));

    stepgate(home.path())
        .args([
            "run",
            pipeline.to_str().unwrap(),
            "--approval",
            "auto-approve",
            "--no-journal",
            "--presentation",
            "console",
            "--state",
            home.path().join("other.json").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("item resolved").not());
}
