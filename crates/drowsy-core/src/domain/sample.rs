//! Labelled samples as enumerated from disk.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Raw label of the drowsy class.
pub const DROWSY_LABEL: &str = "Drowsy";
/// Raw label of the alert class.
pub const NON_DROWSY_LABEL: &str = "Non Drowsy";

/// An image path paired with its ground-truth label string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Path to the image file.
    pub path: PathBuf,
    /// Raw label, normally `"Drowsy"` or `"Non Drowsy"`.
    pub label: String,
}

impl Sample {
    /// Creates a new sample.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
        }
    }
}

/// Maps a raw label to the training target.
///
/// Only the exact string `"Drowsy"` maps to 1.0. Everything else, including
/// typos and unexpected class names, maps to 0.0.
#[must_use]
pub fn binarize_label(raw: &str) -> f32 {
    if raw == DROWSY_LABEL {
        1.0
    } else {
        0.0
    }
}
