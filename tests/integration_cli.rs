/// Integration tests for the greenflow binary
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_simulate_json_output() {
    let mut cmd = Command::cargo_bin("greenflow").unwrap();
    cmd.args(["simulate", "--traffic", "100", "--co2", "420", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"new_predicted_co2\": 329.5"))
        .stdout(predicate::str::contains("\"alert_level\""));
}

#[test]
fn test_simulate_text_report() {
    let mut cmd = Command::cargo_bin("greenflow").unwrap();
    cmd.args(["simulate", "--traffic", "100", "--co2", "420"])
        .assert()
        .success()
        .stdout(predicate::str::contains("420.00 -> 329.50 ppm (21.5%)"))
        .stdout(predicate::str::contains("Risk score: "))
        .stdout(predicate::str::contains("Traffic saved:       90.50 ppm"));
}

#[test]
fn test_simulate_rejects_non_numeric_lever() {
    let mut cmd = Command::cargo_bin("greenflow").unwrap();
    cmd.args(["simulate", "--traffic", "lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parse error (traffic)"));
}

#[test]
fn test_rules_lists_default_table() {
    let mut cmd = Command::cargo_bin("greenflow").unwrap();
    cmd.arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("CO2_HIGH"))
        .stdout(predicate::str::contains("CARBON_HIGH"))
        .stdout(predicate::str::contains("Cooldown: 300s"));
}

#[test]
fn test_rules_honor_environment_overrides() {
    let mut cmd = Command::cargo_bin("greenflow").unwrap();
    cmd.arg("rules")
        .env("GREENFLOW_ALERT_COOLDOWN_SECS", "60")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cooldown: 60s"));
}

#[test]
fn test_replay_reports_alerts() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("readings.jsonl");
    fs::write(
        &input,
        concat!(
            r#"{"sensor_id": "aq-1", "city": "Delhi", "values": {"aqi": 320.0}}"#,
            "\n",
            "not json\n",
            r#"{"sensor_id": "aq-1", "city": "Delhi", "values": {"aqi": 330.0}}"#,
            "\n",
        ),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("greenflow").unwrap();
    cmd.args(["replay", "--input"])
        .arg(&input)
        .env("GREENFLOW_LOG_LEVEL", "error")
        .assert()
        .success()
        .stdout(predicate::str::contains("[CRITICAL] AQI_HIGH"))
        .stdout(predicate::str::contains(
            "Processed 2 reading(s), skipped 1, persisted 1 alert(s)",
        ));
}

#[test]
fn test_replay_uses_recorded_timestamps() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("recorded.jsonl");
    fs::write(
        &input,
        concat!(
            r#"{"sensor_id": "aq-1", "city": "Delhi", "timestamp": "2024-03-01T00:00:00Z", "values": {"aqi": 320.0}}"#,
            "\n",
            r#"{"sensor_id": "aq-1", "city": "Delhi", "timestamp": "2024-03-01T00:10:00Z", "values": {"aqi": 330.0}}"#,
            "\n",
        ),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("greenflow").unwrap();
    cmd.args(["replay", "--input"])
        .arg(&input)
        .env("GREENFLOW_LOG_LEVEL", "error")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Processed 2 reading(s), skipped 0, persisted 2 alert(s)",
        ));
}

#[test]
fn test_missing_config_file_fails() {
    let mut cmd = Command::cargo_bin("greenflow").unwrap();
    cmd.args(["rules", "--config", "/nonexistent/greenflow.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
