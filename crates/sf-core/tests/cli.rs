//! CLI E2E tests for the stdin/stdout transport.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

/// sf-core with a clean environment and a private data file.
fn sf_core(data_file: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("sf-core");
    cmd.timeout(Duration::from_secs(60))
        .env_remove("SF_CONFIG")
        .env_remove("SF_DATA_FILE")
        .env_remove("SF_MODEL")
        .env("RUST_LOG", "warn")
        .arg("--data-file")
        .arg(data_file);
    cmd
}

#[test]
fn stats_on_fresh_install() {
    let dir = tempdir().unwrap();
    sf_core(&dir.path().join("data.json"))
        .write_stdin("/stats\n")
        .assert()
        .success()
        .code(0)
        .stdout(predicate::str::contains("📊 Total rounds: 0"))
        .stdout(predicate::str::contains("Accuracy: 0.00%"));
}

#[test]
fn button_press_is_persisted() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data.json");
    sf_core(&data)
        .write_stdin("/predict\n>pred_2\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("[wrong] ❌ Wrong"))
        .stdout(predicate::str::contains("✅ Correct!"));

    let json: Value = serde_json::from_slice(&fs::read(&data).unwrap()).unwrap();
    assert_eq!(json["totalAll"], 1);
    assert_eq!(json["allCounts"][2], 1);
    assert_eq!(json["correctPredictions"], 1);
}

#[test]
fn unknown_button_is_reported() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data.json");
    sf_core(&data)
        .write_stdin(">pred_9\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Unknown button 'pred_9'"));
    assert!(!data.exists());
}

#[test]
fn wrong_length_batch_is_rejected() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data.json");
    sf_core(&data)
        .write_stdin("1 2 3 4\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Expected exactly 29 digits but found 4"));
    assert!(!data.exists());
}

#[test]
fn ephemeral_mode_writes_nothing() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data.json");
    sf_core(&data)
        .arg("--ephemeral")
        .write_stdin(">correct_5\n/stats\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("📊 Total rounds: 1"));
    assert!(!data.exists());
}

#[test]
fn window_model_prediction_from_cli() {
    let dir = tempdir().unwrap();
    sf_core(&dir.path().join("data.json"))
        .args(["--model", "window_frequency"])
        .write_stdin("/predict\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("among these 4"));
}

#[test]
fn invalid_top_k_exits_with_config_error() {
    let dir = tempdir().unwrap();
    sf_core(&dir.path().join("data.json"))
        .args(["--top-k", "0"])
        .write_stdin("/stats\n")
        .assert()
        .failure()
        .code(10)
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn missing_explicit_config_exits_with_config_error() {
    let dir = tempdir().unwrap();
    sf_core(&dir.path().join("data.json"))
        .arg("--config")
        .arg(dir.path().join("absent.json"))
        .assert()
        .failure()
        .code(10);
}

#[test]
fn config_file_sets_model() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"model": "window_frequency", "topK": 2}"#).unwrap();
    sf_core(&dir.path().join("data.json"))
        .arg("--config")
        .arg(&config)
        .write_stdin("/predict\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("among these 2"));
}
