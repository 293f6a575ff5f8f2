// The cargo_bin! macro requires build script setup that's overkill for simple tests.
// Suppress deprecation warning on the function until we need custom build-dir support.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/snapshot.json")
}

fn arcsim() -> Command {
    let mut cmd = Command::cargo_bin("arcsim").unwrap();
    for var in ["ARCSIM_SNAPSHOT", "ARCSIM_OUTPUT", "ARCSIM_JOURNAL", "ARCSIM_SETTINGS", "ARCSIM_CYCLES"] {
        cmd.env_remove(var);
    }
    cmd
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_help_flag() {
    arcsim()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--snapshot"))
        .stdout(predicate::str::contains("--journal"));
}

#[test]
fn test_single_tick_updates_snapshot_and_journal() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");
    let journal = dir.path().join("journal.json");

    arcsim()
        .arg("--snapshot")
        .arg(fixture())
        .arg("--output")
        .arg(&output)
        .arg("--journal")
        .arg(&journal)
        .assert()
        .success();

    let out = read_json(&output);
    let grain = &out["resources"][0]["countries"]["Avalon"];
    assert_eq!(grain["stock"], serde_json::json!(15));
    assert_eq!(grain["supply"], serde_json::json!(5));
    assert_eq!(out["resources"][0]["countries"]["Lyonesse"]["stock"], serde_json::json!(40));
    assert_eq!(out["resources"][1]["countries"]["Avalon"]["trade_supply"], serde_json::json!(12));

    let province = &out["provinces"][0];
    assert_eq!(province["resources"], serde_json::json!(["iron:8"]));
    assert_eq!(province["map_color"], serde_json::json!("#3a7d44"));
    assert_eq!(province["occupied_workers"], serde_json::json!(15));
    assert_eq!(out["provinces"][1], Value::Null);

    assert_eq!(out["attributes"]["science_points"], serde_json::json!(10000));
    assert_eq!(out["state_metrics"]["state_buildings_income_foreign"], serde_json::json!(7));
    assert_eq!(out["building_templates"][0]["buildable_provinces"], serde_json::json!(["1"]));

    let cells: Vec<String> = serde_json::from_value(read_json(&journal)).unwrap();
    assert_eq!(cells.len(), 2);
    assert!(cells[0].starts_with("[Уведомление]\n"));
    assert!(cells[0].contains("истощает запасы ресурса \"iron\""));
    assert!(cells[1].starts_with("[ВНИМАНИЕ]\n"));
    assert!(cells[1].contains("очков науки"));
}

#[test]
fn test_cycles_and_journal_accumulate() {
    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("world.json");
    std::fs::copy(fixture(), &snapshot).unwrap();
    let journal = dir.path().join("journal.json");

    for _ in 0..2 {
        arcsim()
            .arg("--snapshot")
            .arg(&snapshot)
            .arg("--journal")
            .arg(&journal)
            .env("ARCSIM_CYCLES", "2")
            .assert()
            .success();
    }

    let out = read_json(&snapshot);
    assert_eq!(out["resources"][0]["countries"]["Avalon"]["stock"], serde_json::json!(30));
    assert_eq!(out["provinces"][0]["resources"], serde_json::json!(["iron:2"]));
    assert_eq!(out["provinces"][0]["buildings"][0]["cycle_count"], serde_json::json!(4));

    let cells: Vec<String> = serde_json::from_value(read_json(&journal)).unwrap();
    assert_eq!(cells.len(), 2);
    assert_eq!(cells[1].lines().count(), 5);
}

#[test]
fn test_settings_disable_categories() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");
    let journal = dir.path().join("journal.json");
    let settings = dir.path().join("settings.json");
    std::fs::write(
        &settings,
        r#"{"journal": {"disabled_categories": ["ВНИМАНИЕ"]}}"#,
    )
    .unwrap();

    arcsim()
        .arg("--snapshot")
        .arg(fixture())
        .arg("--output")
        .arg(&output)
        .arg("--journal")
        .arg(&journal)
        .arg("--settings")
        .arg(&settings)
        .assert()
        .success();

    let cells: Vec<String> = serde_json::from_value(read_json(&journal)).unwrap();
    assert_eq!(cells.len(), 1);
    assert!(cells[0].starts_with("[Уведомление]"));
}

#[test]
fn test_failed_tick_saves_nothing() {
    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("stateless.json");
    std::fs::write(&snapshot, r#"{"provinces": []}"#).unwrap();
    let output = dir.path().join("out.json");
    let journal = dir.path().join("journal.json");

    arcsim()
        .arg("--snapshot")
        .arg(&snapshot)
        .arg("--output")
        .arg(&output)
        .arg("--journal")
        .arg(&journal)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing was saved"));

    assert!(!output.exists());
    assert!(!journal.exists());
}

#[test]
fn test_invalid_settings_rejected() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("settings.json");
    std::fs::write(
        &settings,
        r#"{"simulation": {"self_destruction_start": 2, "self_destruction_warning": 5}}"#,
    )
    .unwrap();

    arcsim()
        .arg("--snapshot")
        .arg(fixture())
        .arg("--output")
        .arg(dir.path().join("out.json"))
        .arg("--settings")
        .arg(&settings)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid simulation settings"));
}

#[test]
fn test_missing_snapshot_fails() {
    arcsim()
        .arg("--snapshot")
        .arg("/nonexistent/world.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nonexistent"));
}
