//! CLI argument validation tests.
//!
//! Tests command-line argument parsing, validation, and error handling.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use assert_cmd::Command;
use drowsy_test_support::DatasetDirBuilder;
use predicates::prelude::*;

fn drowsy() -> Command {
    Command::cargo_bin("drowsy").unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    drowsy()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("train")
                .and(predicate::str::contains("evaluate"))
                .and(predicate::str::contains("models")),
        );
}

#[test]
fn test_missing_subcommand_fails() {
    drowsy().assert().failure();
}

#[test]
fn test_missing_dataset_dir_exits_2() {
    let models = tempfile::tempdir().unwrap();
    drowsy()
        .arg("train")
        .arg("/nonexistent/dataset")
        .arg("--models-dir")
        .arg(models.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_dataset_without_class_folder_fails() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::create_dir(temp.path().join("Drowsy")).unwrap();

    drowsy()
        .arg("dataset")
        .arg(temp.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Non Drowsy"));
}

#[test]
fn test_test_fraction_out_of_range_rejected() {
    drowsy()
        .args(["train", "data", "--test-fraction", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not strictly between 0 and 1"));
}

#[test]
fn test_zero_epochs_rejected() {
    drowsy()
        .args(["train", "data", "--epochs", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("epochs must be at least 1"));
}

#[test]
fn test_missing_models_names_the_file() {
    let dataset = DatasetDirBuilder::new().unwrap().balanced(3).unwrap();
    let models = tempfile::tempdir().unwrap();

    drowsy()
        .arg("train")
        .arg(dataset.path())
        .arg("--models-dir")
        .arg(models.path())
        .arg("--epochs")
        .arg("1")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("blazeface.safetensors"));
}

#[test]
fn test_evaluate_requires_weights() {
    drowsy()
        .args(["evaluate", "data"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--weights"));
}

#[test]
fn test_features_requires_paths() {
    drowsy().arg("features").assert().failure();
}

#[test]
fn test_models_list_shows_missing() {
    let models = tempfile::tempdir().unwrap();
    drowsy()
        .args(["models", "list", "--models-dir"])
        .arg(models.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("✗ blazeface (blazeface.safetensors)")
                .and(predicate::str::contains("✗ landmarks68"))
                .and(predicate::str::contains("0/2 models installed")),
        );
}

#[test]
fn test_models_path_uses_override() {
    let models = tempfile::tempdir().unwrap();
    drowsy()
        .args(["models", "path", "--models-dir"])
        .arg(models.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(models.path().to_str().unwrap()));
}

#[test]
fn test_dataset_summary() {
    let dataset = DatasetDirBuilder::new().unwrap().balanced(5).unwrap();

    drowsy()
        .arg("dataset")
        .arg(dataset.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Drowsy: 5")
                .and(predicate::str::contains("Non Drowsy: 5"))
                .and(predicate::str::contains("Total: 10"))
                .and(predicate::str::contains("Train: 8"))
                .and(predicate::str::contains("Test: 2")),
        );
}

#[test]
fn test_dataset_head_lists_samples() {
    let dataset = DatasetDirBuilder::new().unwrap().balanced(5).unwrap();

    let output = drowsy()
        .arg("dataset")
        .arg(dataset.path())
        .args(["--head", "3"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let listed = stdout
        .lines()
        .filter(|l| l.ends_with(".png (Drowsy)") || l.ends_with(".png (Non Drowsy)"))
        .count();
    assert_eq!(listed, 3);
}
