//! Core domain types for drowsiness detection.

mod item;
mod landmarks;
mod sample;

pub use item::{DatasetItem, FeatureVector, ImageBuffer, IMAGE_CHANNELS, IMAGE_SIZE};
pub use landmarks::{FaceBox, Landmarks, Point, LANDMARK_COUNT};
pub use sample::{binarize_label, Sample, DROWSY_LABEL, NON_DROWSY_LABEL};
