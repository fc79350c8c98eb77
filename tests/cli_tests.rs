// CLI integration tests for the batch-oee binary

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const INTERVALS: &str = r#"[
    {"timestamp_start": "2024-12-15T08:00:00Z", "timestamp_end": "2024-12-15T08:30:00Z",
     "operation": "Heating", "unit_id": "R-101", "batch_id": "B-7"},
    {"timestamp_start": "2024-12-15T08:30:00Z", "timestamp_end": "2024-12-15T09:00:00Z",
     "operation": "Cooling", "unit_id": "R-101", "batch_id": "B-7"},
    {"timestamp_start": "2024-12-15T09:00:00Z", "timestamp_end": null,
     "operation": "Mixing", "unit_id": "R-101", "batch_id": "B-7"}
]"#;

const CONFIG: &str = r#"
value_added_times:
  Mixing: 60
loss_mappings:
  Heating: speed_loss
  Cooling: planned_stop
  Mixing: value_added
  idle: unplanned_stop
"#;

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("intervals.json"), INTERVALS).unwrap();
    fs::write(dir.path().join("oee.yaml"), CONFIG).unwrap();
    dir
}

fn cmd(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("batch-oee");
    cmd.arg("--intervals")
        .arg(dir.path().join("intervals.json"))
        .arg("--start")
        .arg("2024-12-15T08:00:00Z")
        .arg("--end")
        .arg("2024-12-15T10:00:00Z");
    cmd
}

#[test]
fn test_text_report() {
    let dir = setup();

    cmd(&dir)
        .arg("--config")
        .arg(dir.path().join("oee.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Availability 100.0%"))
        .stdout(predicate::str::contains("Performance 66.7%"))
        .stdout(predicate::str::contains("OEE 66.7%"))
        .stdout(predicate::str::contains("Time breakdown:"));
}

#[test]
fn test_json_report() {
    let dir = setup();

    let output = cmd(&dir)
        .arg("--config")
        .arg(dir.path().join("oee.yaml"))
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["time_breakdown"]["value_added"], 60.0);
    assert_eq!(report["time_breakdown"]["speed_loss"], 30.0);
    assert_eq!(report["time_breakdown"]["planned_stop"], 30.0);
    assert_eq!(report["oee_metrics"]["quality"], 1.0);
    assert_eq!(report["categorized_intervals"].as_array().unwrap().len(), 3);
}

#[test]
fn test_csv_report() {
    let dir = setup();

    cmd(&dir)
        .arg("--config")
        .arg(dir.path().join("oee.yaml"))
        .arg("--format")
        .arg("csv")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("unit_id,batch_id,operation"))
        .stdout(predicate::str::contains("R-101,B-7,Mixing"))
        .stdout(predicate::str::contains(",value_added,60.000,false,true,false"));
}

#[test]
fn test_breakdown_csv_report() {
    let dir = setup();

    cmd(&dir)
        .arg("--config")
        .arg(dir.path().join("oee.yaml"))
        .arg("--format")
        .arg("breakdown-csv")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("category,minutes\n"))
        .stdout(predicate::str::contains("value_added,60.000\n"))
        .stdout(predicate::str::contains("speed_loss,30.000\n"))
        .stdout(predicate::str::contains("rework_scrap,0.000\n"));
}

#[test]
fn test_live_evaluation() {
    let dir = setup();

    let output = cmd(&dir)
        .arg("--config")
        .arg(dir.path().join("oee.yaml"))
        .arg("--now")
        .arg("2024-12-15T09:30:00Z")
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["time_breakdown"]["value_added"], 30.0);
    assert_eq!(report["time_breakdown"]["unplanned_stop"], 30.0);
}

#[test]
fn test_default_config_reports_unmapped() {
    let dir = setup();

    // Built-in mappings are lower-case, so the capitalised names are unmapped
    cmd(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Unmapped operation 'Heating'"));
}

#[test]
fn test_strict_fails_on_unmapped() {
    let dir = setup();

    cmd(&dir)
        .arg("--strict")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing from loss_mappings"));
}

#[test]
fn test_invalid_window() {
    let dir = setup();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("batch-oee");
    cmd.arg("--intervals")
        .arg(dir.path().join("intervals.json"))
        .arg("--start")
        .arg("2024-12-15T10:00:00Z")
        .arg("--end")
        .arg("2024-12-15T08:00:00Z")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid analysis window"));
}

#[test]
fn test_unknown_category_in_config() {
    let dir = setup();
    let bad = dir.path().join("bad.yaml");
    fs::write(&bad, "loss_mappings:\n  Heating: tea_break\n").unwrap();

    cmd(&dir)
        .arg("--config")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("tea_break"));
}

#[test]
fn test_missing_intervals_file() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("batch-oee");
    cmd.arg("--intervals")
        .arg("/nonexistent/intervals.json")
        .arg("--start")
        .arg("2024-12-15T08:00:00Z")
        .arg("--end")
        .arg("2024-12-15T10:00:00Z")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read intervals file"));
}

#[test]
fn test_reject_overlaps() {
    let dir = setup();
    let overlapping = dir.path().join("overlap.json");
    fs::write(
        &overlapping,
        r#"[
            {"timestamp_start": "2024-12-15T08:00:00Z", "timestamp_end": "2024-12-15T09:00:00Z",
             "operation": "Heating", "unit_id": "R-101"},
            {"timestamp_start": "2024-12-15T08:30:00Z", "timestamp_end": "2024-12-15T09:30:00Z",
             "operation": "Cooling", "unit_id": "R-101"}
        ]"#,
    )
    .unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("batch-oee");
    cmd.arg("--intervals")
        .arg(&overlapping)
        .arg("--start")
        .arg("2024-12-15T08:00:00Z")
        .arg("--end")
        .arg("2024-12-15T10:00:00Z")
        .arg("--overlap")
        .arg("reject")
        .assert()
        .failure()
        .stderr(predicate::str::contains("overlap"));
}
