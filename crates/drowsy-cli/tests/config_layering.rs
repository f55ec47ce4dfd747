//! Integration tests for configuration layering.
//!
//! Tests the priority chain: hardcoded defaults < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;

use assert_cmd::Command;
use drowsy_test_support::DatasetDirBuilder;
use predicates::prelude::*;

#[test]
fn test_project_config_sets_models_dir() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join(".drowsy.toml"),
        "[models]\ndir = '/opt/drowsy-models'\n",
    )
    .unwrap();

    Command::cargo_bin("drowsy")
        .unwrap()
        .current_dir(temp_dir.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/opt/drowsy-models"));
}

#[test]
fn test_cli_overrides_project_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join(".drowsy.toml"),
        "[models]\ndir = '/opt/drowsy-models'\n",
    )
    .unwrap();

    Command::cargo_bin("drowsy")
        .unwrap()
        .current_dir(temp_dir.path())
        .args(["models", "path", "--models-dir", "/srv/weights"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/srv/weights"))
        .stdout(predicate::str::contains("/opt/drowsy-models").not());
}

#[test]
fn test_project_config_found_in_parent() {
    let temp_dir = tempfile::tempdir().unwrap();
    let nested = temp_dir.path().join("runs").join("today");
    fs::create_dir_all(&nested).unwrap();
    fs::write(
        temp_dir.path().join(".drowsy.toml"),
        "[training]\ntest_fraction = 0.5\n",
    )
    .unwrap();
    let dataset = DatasetDirBuilder::new().unwrap().balanced(5).unwrap();

    Command::cargo_bin("drowsy")
        .unwrap()
        .current_dir(&nested)
        .arg("dataset")
        .arg(dataset.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Train: 5").and(predicate::str::contains("Test: 5")));
}

#[test]
fn test_cli_fraction_beats_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join(".drowsy.toml"),
        "[training]\ntest_fraction = 0.5\n",
    )
    .unwrap();
    let dataset = DatasetDirBuilder::new().unwrap().balanced(5).unwrap();

    Command::cargo_bin("drowsy")
        .unwrap()
        .current_dir(temp_dir.path())
        .arg("dataset")
        .arg(dataset.path())
        .args(["--test-fraction", "0.3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Train: 7").and(predicate::str::contains("Test: 3")));
}

#[test]
fn test_invalid_config_warns() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join(".drowsy.toml"),
        "[training]\nepochs = 0\n",
    )
    .unwrap();

    Command::cargo_bin("drowsy")
        .unwrap()
        .current_dir(temp_dir.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning: training.epochs must be at least 1"));
}
