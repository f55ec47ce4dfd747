//! Integration tests for dataset discovery and splitting.

#![allow(clippy::unwrap_used)]

use drowsy_adapters::{collect_images, discover_samples, train_test_split};
use drowsy_core::domain::{DROWSY_LABEL, NON_DROWSY_LABEL};
use drowsy_test_support::{DatasetDirBuilder, SyntheticImageBuilder};

#[test]
fn test_discovery_labels_by_folder_in_order() {
    let gray = SyntheticImageBuilder::uniform_gray(16, 16, 100);
    let dataset = DatasetDirBuilder::new()
        .unwrap()
        .image(NON_DROWSY_LABEL, "b.png", &gray)
        .unwrap()
        .image(DROWSY_LABEL, "z.jpg", &gray)
        .unwrap()
        .image(DROWSY_LABEL, "a.png", &gray)
        .unwrap()
        .image(NON_DROWSY_LABEL, "a.bmp", &gray)
        .unwrap();

    let samples = discover_samples(dataset.path()).unwrap();
    let found: Vec<(String, &str)> = samples
        .iter()
        .map(|s| {
            let name = s.path.file_name().unwrap().to_string_lossy().into_owned();
            (name, s.label.as_str())
        })
        .collect();

    assert_eq!(
        found,
        vec![
            ("a.png".to_string(), DROWSY_LABEL),
            ("z.jpg".to_string(), DROWSY_LABEL),
            ("a.bmp".to_string(), NON_DROWSY_LABEL),
            ("b.png".to_string(), NON_DROWSY_LABEL),
        ]
    );
}

#[test]
fn test_discovery_skips_other_files_and_subdirs() {
    let dataset = DatasetDirBuilder::new().unwrap().balanced(1).unwrap();
    std::fs::write(dataset.path().join("Drowsy/notes.txt"), "x").unwrap();
    std::fs::create_dir(dataset.path().join("Drowsy/nested")).unwrap();

    let samples = discover_samples(dataset.path()).unwrap();
    assert_eq!(samples.len(), 2);
}

#[test]
fn test_discovery_requires_both_folders() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join(DROWSY_LABEL)).unwrap();

    let err = discover_samples(dir.path()).unwrap_err();
    assert!(err.to_string().contains(NON_DROWSY_LABEL));
}

#[test]
fn test_discover_then_split() {
    let dataset = DatasetDirBuilder::new().unwrap().balanced(5).unwrap();
    let samples = discover_samples(dataset.path()).unwrap();

    let (train, test) = train_test_split(samples.clone(), 0.2, 42).unwrap();
    assert_eq!((train.len(), test.len()), (8, 2));

    let (train_again, test_again) = train_test_split(samples, 0.2, 42).unwrap();
    assert_eq!(train, train_again);
    assert_eq!(test, test_again);
}

#[test]
fn test_collect_images_mixes_files_and_dirs() {
    let dataset = DatasetDirBuilder::new().unwrap().balanced(2).unwrap();
    let single = dataset.written()[1].clone();

    let files = collect_images(&[
        dataset.path().join(DROWSY_LABEL),
        single,
        dataset.path().join("missing.png"),
    ]);
    assert_eq!(files.len(), 3);
    assert!(files[0].ends_with("Drowsy/drowsy_000.png"));
    assert!(files[2].ends_with("Non Drowsy/alert_000.png"));
}
