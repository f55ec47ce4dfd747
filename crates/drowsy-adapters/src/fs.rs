//! Filesystem discovery of labelled samples.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use drowsy_core::domain::{Sample, DROWSY_LABEL, NON_DROWSY_LABEL};
use tracing::{debug, warn};

/// Image extensions the pipeline can decode.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tiff", "tif", "webp"];

/// Lists the labelled samples under a dataset root.
///
/// Images in `root/Drowsy` come first, then images in `root/Non Drowsy`.
/// Each class is sorted by path. Subdirectories and files with other
/// extensions are skipped.
///
/// # Errors
///
/// Returns an error if either class folder is missing or unreadable.
pub fn discover_samples(root: &Path) -> Result<Vec<Sample>> {
    let mut samples = Vec::new();
    for label in [DROWSY_LABEL, NON_DROWSY_LABEL] {
        let dir = root.join(label);
        ensure!(
            dir.is_dir(),
            "dataset folder {} not found (expected '{DROWSY_LABEL}' and '{NON_DROWSY_LABEL}' under {})",
            dir.display(),
            root.display()
        );

        let files = images_in_dir(&dir)?;
        debug!("Found {} images labelled {label}", files.len());
        samples.extend(files.into_iter().map(|path| Sample::new(path, label)));
    }
    Ok(samples)
}

/// Expands files and directories into a sorted list of image files.
///
/// Directories are scanned one level deep. Missing paths and unsupported
/// files are skipped with a warning.
#[must_use]
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            if is_supported_image(path) {
                files.push(path.clone());
            } else {
                warn!("Unsupported file type: {}", path.display());
            }
        } else if path.is_dir() {
            match images_in_dir(path) {
                Ok(found) => files.extend(found),
                Err(e) => warn!("{e:#}"),
            }
        } else {
            warn!("Path does not exist: {}", path.display());
        }
    }
    files
}

/// Checks if a path has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

fn images_in_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("face.jpg")));
        assert!(is_supported_image(Path::new("face.JPEG")));
        assert!(is_supported_image(Path::new("face.png")));
        assert!(is_supported_image(Path::new("face.webp")));
        assert!(!is_supported_image(Path::new("face.cr2")));
        assert!(!is_supported_image(Path::new("labels.txt")));
        assert!(!is_supported_image(Path::new("face")));
    }
}
