//! Per-sample transform: image file to network inputs.
//!
//! For every request the image is decoded, resized to 128x128, converted to
//! grayscale for detection and passed through the face detector and the
//! landmark predictor. Only the first detected face is used.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use tracing::{debug, trace};

use super::geometry::{eye_aspect_ratio, mouth_opening_ratio, nose_length_ratio};
use crate::domain::{binarize_label, DatasetItem, FeatureVector, ImageBuffer, IMAGE_SIZE};
use crate::ports::{FaceDetector, LandmarkPredictor};

/// Computes the feature vector for a grayscale face image.
///
/// Returns `None` when the detector finds no face.
///
/// # Errors
///
/// Returns an error if the detector or predictor fails.
pub fn extract_features(
    gray: &GrayImage,
    detector: &dyn FaceDetector,
    predictor: &dyn LandmarkPredictor,
) -> Result<Option<FeatureVector>> {
    let faces = detector.detect(gray).context("Face detection failed")?;
    let Some(face) = faces.first() else {
        return Ok(None);
    };
    trace!("Using first of {} faces: {:?}", faces.len(), face);

    let landmarks = predictor
        .predict(gray, face)
        .context("Landmark prediction failed")?;

    Ok(Some(FeatureVector::new(
        eye_aspect_ratio(&landmarks.left_eye()),
        eye_aspect_ratio(&landmarks.right_eye()),
        mouth_opening_ratio(&landmarks.mouth()),
        nose_length_ratio(landmarks.nose_top(), landmarks.nose_tip(), landmarks.chin()),
    )))
}

/// Opt-in memo of landmark outcomes keyed by image path.
///
/// Stores `None` for images where no face was found so the no-face branch is
/// reproduced exactly on later hits.
#[derive(Debug, Default)]
pub struct FeatureCache {
    entries: Mutex<HashMap<PathBuf, Option<FeatureVector>>>,
}

impl FeatureCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a cached outcome. The outer `Option` is the cache hit.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<Option<FeatureVector>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .copied()
    }

    /// Records an outcome.
    pub fn insert(&self, path: PathBuf, features: Option<FeatureVector>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, features);
    }

    /// Number of cached paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing has been cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The landmark and feature transform applied to every dataset item.
#[derive(Clone)]
pub struct FeaturePipeline {
    detector: Arc<dyn FaceDetector>,
    predictor: Arc<dyn LandmarkPredictor>,
    cache: Option<Arc<FeatureCache>>,
}

impl FeaturePipeline {
    /// Creates an uncached pipeline.
    #[must_use]
    pub fn new(detector: Arc<dyn FaceDetector>, predictor: Arc<dyn LandmarkPredictor>) -> Self {
        Self {
            detector,
            predictor,
            cache: None,
        }
    }

    /// Enables the per-path feature cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<FeatureCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Returns the cache, if enabled.
    #[must_use]
    pub fn cache(&self) -> Option<&FeatureCache> {
        self.cache.as_deref()
    }

    /// Loads an image and returns it resized to the network input size.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load_resized(path: &Path) -> Result<DynamicImage> {
        let image =
            image::open(path).with_context(|| format!("Failed to open image: {}", path.display()))?;
        let size = u32::try_from(IMAGE_SIZE)?;
        Ok(image.resize_exact(size, size, FilterType::Triangle))
    }

    /// Computes features for one image file, `None` if no face was found.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, detection or prediction fails.
    pub fn features_for(&self, path: &Path) -> Result<Option<FeatureVector>> {
        let resized = Self::load_resized(path)?;
        self.features_from_resized(path, &resized)
    }

    /// Runs the full transform for one sample.
    ///
    /// If no face is detected the item carries the zero feature vector and
    /// label 0.0, whatever `raw_label` says.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, detection or prediction fails.
    pub fn process(&self, path: &Path, raw_label: &str) -> Result<DatasetItem> {
        let resized = Self::load_resized(path)?;
        let image = ImageBuffer::from_rgb(&resized.to_rgb8())?;

        let item = match self.features_from_resized(path, &resized)? {
            Some(features) => DatasetItem {
                image,
                features,
                label: binarize_label(raw_label),
            },
            None => {
                debug!("No face found in {}", path.display());
                DatasetItem {
                    image,
                    features: FeatureVector::NO_FACE,
                    label: 0.0,
                }
            }
        };
        Ok(item)
    }

    fn features_from_resized(
        &self,
        path: &Path,
        resized: &DynamicImage,
    ) -> Result<Option<FeatureVector>> {
        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(path)) {
            trace!("Feature cache hit: {}", path.display());
            return Ok(hit);
        }

        let gray = resized.to_luma8();
        let features = extract_features(&gray, self.detector.as_ref(), self.predictor.as_ref())
            .with_context(|| format!("Feature extraction failed for {}", path.display()))?;

        if let Some(cache) = &self.cache {
            cache.insert(path.to_path_buf(), features);
        }
        Ok(features)
    }
}
