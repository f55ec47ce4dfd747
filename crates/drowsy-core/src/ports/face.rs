//! Face detection and landmark prediction ports.

use image::GrayImage;

use crate::domain::{FaceBox, Landmarks};

/// Finds faces in a grayscale image.
pub trait FaceDetector: Send + Sync {
    /// Returns detected faces, most confident first.
    ///
    /// An empty vector means no face was found.
    ///
    /// # Errors
    ///
    /// Returns an error if detection fails.
    fn detect(&self, gray: &GrayImage) -> anyhow::Result<Vec<FaceBox>>;
}

/// Locates 68 landmarks inside a detected face.
pub trait LandmarkPredictor: Send + Sync {
    /// Predicts landmarks for `face` in pixel coordinates of `gray`.
    ///
    /// # Errors
    ///
    /// Returns an error if prediction fails.
    fn predict(&self, gray: &GrayImage, face: &FaceBox) -> anyhow::Result<Landmarks>;
}

impl<T: FaceDetector + ?Sized> FaceDetector for Box<T> {
    fn detect(&self, gray: &GrayImage) -> anyhow::Result<Vec<FaceBox>> {
        (**self).detect(gray)
    }
}

impl<T: LandmarkPredictor + ?Sized> LandmarkPredictor for Box<T> {
    fn predict(&self, gray: &GrayImage, face: &FaceBox) -> anyhow::Result<Landmarks> {
        (**self).predict(gray, face)
    }
}
