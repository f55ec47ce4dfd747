//! Mock implementations of core port traits.

use std::sync::{Arc, Mutex, PoisonError};

use drowsy_core::domain::{FaceBox, Landmarks};
use drowsy_core::ports::{FaceDetector, LandmarkPredictor, TrainingEvent, TrainingProgress};
use image::GrayImage;

/// Mock implementation of `FaceDetector`.
///
/// Returns a fixed list of faces, optionally only for images whose mean
/// brightness reaches a threshold, and counts calls.
pub struct MockFaceDetector {
    faces: Vec<FaceBox>,
    min_mean_luma: Option<u8>,
    calls: Arc<Mutex<usize>>,
}

impl MockFaceDetector {
    /// Creates a detector that always returns `faces`.
    #[must_use]
    pub fn new(faces: Vec<FaceBox>) -> Self {
        Self {
            faces,
            min_mean_luma: None,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates a detector that finds one face covering a 128x128 image.
    #[must_use]
    pub fn always() -> Self {
        Self::new(vec![FaceBox {
            x: 0,
            y: 0,
            width: 128,
            height: 128,
            score: 0.99,
        }])
    }

    /// Creates a detector that never finds a face.
    #[must_use]
    pub fn never() -> Self {
        Self::new(vec![])
    }

    /// Only reports faces for images with mean brightness of at least `min`.
    #[must_use]
    pub const fn bright_only(mut self, min: u8) -> Self {
        self.min_mean_luma = Some(min);
        self
    }

    /// Returns the number of `detect` calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FaceDetector for MockFaceDetector {
    fn detect(&self, gray: &GrayImage) -> anyhow::Result<Vec<FaceBox>> {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;

        if let Some(min) = self.min_mean_luma {
            let pixels = u64::from(gray.width()) * u64::from(gray.height());
            let sum: u64 = gray.pixels().map(|p| u64::from(p.0[0])).sum();
            if pixels == 0 || sum / pixels < u64::from(min) {
                return Ok(vec![]);
            }
        }
        Ok(self.faces.clone())
    }
}

/// Mock implementation of `LandmarkPredictor`.
///
/// Returns the same landmark set for every face and counts calls.
pub struct MockLandmarkPredictor {
    landmarks: Landmarks,
    calls: Arc<Mutex<usize>>,
}

impl MockLandmarkPredictor {
    /// Creates a predictor returning `landmarks`.
    #[must_use]
    pub fn new(landmarks: Landmarks) -> Self {
        Self {
            landmarks,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns the number of `predict` calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LandmarkPredictor for MockLandmarkPredictor {
    fn predict(&self, _gray: &GrayImage, _face: &FaceBox) -> anyhow::Result<Landmarks> {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(self.landmarks.clone())
    }
}

/// Mock implementation of `TrainingProgress`.
///
/// Captures events for later assertions.
#[derive(Default)]
pub struct MockTrainingProgress {
    events: Arc<Mutex<Vec<TrainingEvent>>>,
}

impl MockTrainingProgress {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<TrainingEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `BatchCompleted` events.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, TrainingEvent::BatchCompleted { .. }))
            .count()
    }

    /// Returns the mean losses from `EpochCompleted` events, in order.
    #[must_use]
    pub fn epoch_losses(&self) -> Vec<f32> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                TrainingEvent::EpochCompleted { mean_loss, .. } => Some(*mean_loss),
                _ => None,
            })
            .collect()
    }

    /// Returns the epoch count from the `Finished` event, if any.
    #[must_use]
    pub fn finished_epochs(&self) -> Option<usize> {
        self.events().iter().find_map(|e| match e {
            TrainingEvent::Finished { epochs, .. } => Some(*epochs),
            _ => None,
        })
    }
}

impl TrainingProgress for MockTrainingProgress {
    fn on_event(&self, event: TrainingEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
