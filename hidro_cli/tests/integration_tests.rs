//! Integration tests for the hidro binary.
//!
//! These tests verify end-to-end behavior including:
//! - Recording readings with capture validation
//! - Forecast output
//! - Editing, deleting and clearing readings
//! - CSV export/import

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI invocation isolated from the user's config and data
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hidro").expect("Failed to find hidro binary");
    cmd.env("XDG_CONFIG_HOME", dir.join("config"))
        .env("HOME", dir)
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(dir.join("data"));
    cmd
}

fn add_liters(dir: &Path, liters: &str, at: &str) {
    cli(dir)
        .args(["add", "--liters", liters, "--at", at])
        .assert()
        .success();
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Household water meter log and consumption forecast",
        ));
}

#[test]
fn test_add_creates_store() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["add", "--digits", "001234", "--lat", "-23.5", "--lng", "-46.6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reading recorded: 12,34 m³ (12.340 L)"));

    let contents = fs::read_to_string(dir.join("data/readings.json")).unwrap();
    assert!(contents.contains("\"reading\":12340.0"));
    assert!(contents.contains("\"lat\":-23.5"));
}

#[test]
fn test_forecast_daily_and_weekly() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    add_liters(dir, "1000", "2024-01-01T00:00:00Z");
    add_liters(dir, "2000", "2024-01-02T00:00:00Z");

    cli(dir)
        .arg("forecast")
        .assert()
        .success()
        .stdout(predicate::str::contains("1,00 m³ (1.000 L/day)"))
        .stdout(predicate::str::contains("7,00 m³ (7.000 L)"))
        .stdout(predicate::str::contains("30,00 m³ (30.000 L)"));
}

#[test]
fn test_default_command_is_forecast() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Not enough readings"))
        .stdout(predicate::str::contains("Daily average:   0,00 m³"));
}

#[test]
fn test_forecast_custom_horizon() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    add_liters(dir, "1000", "2024-01-01T00:00:00Z");
    add_liters(dir, "1500", "2024-01-01T12:00:00Z");
    add_liters(dir, "2500", "2024-01-02T00:00:00Z");

    cli(dir)
        .args(["forecast", "--days", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.500 L/day"))
        .stdout(predicate::str::contains("Next 2 days:"))
        .stdout(predicate::str::contains("3.000 L"));
}

#[test]
fn test_add_rejects_non_increasing_reading() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    add_liters(dir, "1500", "2024-01-01T00:00:00Z");

    cli(dir)
        .args(["add", "--liters", "1500", "--at", "2024-01-02T00:00:00Z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "must be greater than the last recorded reading",
        ));

    let contents = fs::read_to_string(dir.join("data/readings.json")).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(stored.as_array().unwrap().len(), 1);
}

#[test]
fn test_add_rejects_incomplete_digits() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["add", "--digits", "123"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("six meter digits"));
}

#[test]
fn test_add_requires_a_source() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path()).arg("add").assert().failure();
}

#[test]
fn test_add_from_image() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let image = dir.join("meter.jpg");
    fs::write(&image, b"\xff\xd8\xff\xe0").unwrap();

    cli(dir)
        .args(["add", "--image"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("Recognized dial: 0001"));
}

#[test]
fn test_list_newest_first_with_store_indices() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    add_liters(dir, "1000", "2024-01-01T08:00:00Z");
    add_liters(dir, "2000", "2024-01-03T08:00:00Z");

    let output = cli(dir).arg("list").assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();

    let newest = stdout.find("#1").expect("missing #1");
    let oldest = stdout.find("#0").expect("missing #0");
    assert!(newest < oldest);
    assert!(stdout.contains("03/01/2024 08:00"));
    assert!(stdout.contains("2.000 L"));
}

#[test]
fn test_edit_and_delete() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    add_liters(dir, "1000", "2024-01-01T00:00:00Z");
    add_liters(dir, "2000", "2024-01-02T00:00:00Z");
    add_liters(dir, "3000", "2024-01-03T00:00:00Z");

    cli(dir)
        .args(["edit", "1", "2500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("updated to 2.500 L"));

    cli(dir)
        .args(["edit", "1", "3500"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot exceed the next one"));

    cli(dir)
        .args(["delete", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted reading #0"));

    cli(dir)
        .args(["delete", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));

    cli(dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("2.500 L"))
        .stdout(predicate::str::contains("1.000 L").not());
}

#[test]
fn test_export_and_import() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let csv_path = dir.join("export/readings.csv");

    add_liters(dir, "1000", "2024-01-01T00:00:00Z");
    add_liters(dir, "2000", "2024-01-02T00:00:00Z");

    cli(dir)
        .arg("export")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 readings"));
    assert!(csv_path.exists());

    cli(dir).args(["clear", "--all"]).assert().success();

    cli(dir)
        .arg("import")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 readings"));

    cli(dir)
        .arg("forecast")
        .assert()
        .success()
        .stdout(predicate::str::contains("1.000 L/day"));
}

#[test]
fn test_import_skips_non_finite_rows() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let csv_path = dir.join("bad.csv");
    fs::write(
        &csv_path,
        "reading,timestamp,lat,lng,simulated\n\
         NaN,2024-01-03T00:00:00Z,,,false\n",
    )
    .unwrap();

    add_liters(dir, "1000", "2024-01-01T00:00:00Z");
    add_liters(dir, "2000", "2024-01-02T00:00:00Z");

    cli(dir)
        .arg("import")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 0 readings"));

    cli(dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("1.000 L"))
        .stdout(predicate::str::contains("2.000 L"));
    assert!(!dir.join("data/readings.json.corrupt").exists());
}

#[test]
fn test_forecast_huge_horizon_label() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["forecast", "--days", "1e300"])
        .assert()
        .success()
        .stdout(predicate::str::contains("9223372036854775807").not());
}

#[test]
fn test_forecast_detail_shows_skipped_segments() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let csv_path = dir.join("history.csv");
    fs::write(
        &csv_path,
        "reading,timestamp,lat,lng,simulated\n\
         1000,2024-01-01T00:00:00Z,,,false\n\
         2000,2024-01-02T00:00:00Z,,,false\n\
         1500,2024-01-03T00:00:00Z,,,false\n\
         1500,2024-01-03T00:00:00Z,,,false\n",
    )
    .unwrap();

    cli(dir).arg("import").arg(&csv_path).assert().success();

    cli(dir)
        .args(["forecast", "--detail"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.000 L/day"))
        .stdout(predicate::str::contains("skipped: meter went backwards"))
        .stdout(predicate::str::contains("skipped: same timestamp"))
        .stdout(predicate::str::contains("Duration-weighted rate"));
}

#[test]
fn test_clear_simulated_keeps_real_readings() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    add_liters(dir, "1000", "2024-01-01T00:00:00Z");
    cli(dir)
        .args(["add", "--liters", "1100", "--at", "2024-01-02T00:00:00Z", "--simulated"])
        .assert()
        .success();

    cli(dir)
        .args(["clear", "--simulated"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 simulated readings"));

    cli(dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("1.000 L"))
        .stdout(predicate::str::contains("simulated").not());
}

#[test]
fn test_week_view_counts_current_week() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir).args(["add", "--liters", "4200"]).assert().success();

    cli(dir)
        .arg("week")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 readings this week"));

    cli(dir)
        .args(["week", "--offset", "-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 readings this week"));
}

#[test]
fn test_corrupted_store_recovers() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    fs::create_dir_all(dir.join("data")).unwrap();
    fs::write(dir.join("data/readings.json"), "not json").unwrap();

    cli(dir).arg("list").assert().success().stdout(predicate::str::contains("No readings yet"));

    add_liters(dir, "10", "2024-01-01T00:00:00Z");
    assert!(dir.join("data/readings.json.corrupt").exists());
}
