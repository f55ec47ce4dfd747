//! Test support utilities for drowsy.
//!
//! Provides port mocks, synthetic images, landmark sets with known ratios and
//! on-disk dataset fixtures, plus zero-initialized face model weights for
//! end-to-end runs without real models.
//!
//! # Example
//!
//! ```
//! use drowsy_test_support::{LandmarkBuilder, MockFaceDetector, MockLandmarkPredictor};
//!
//! // Wide open eyes: EAR = 10 / 20
//! let landmarks = LandmarkBuilder::new().eye_height(10).build();
//!
//! let detector = MockFaceDetector::always();
//! let predictor = MockLandmarkPredictor::new(landmarks);
//! ```

mod builders;
mod mocks;
mod models;

pub use builders::{DatasetDirBuilder, LandmarkBuilder, SyntheticImageBuilder};
pub use mocks::{MockFaceDetector, MockLandmarkPredictor, MockTrainingProgress};
pub use models::write_zero_models;
