//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the domain core and the
//! detection backends or UI adapters that plug into it.

mod face;
mod progress;

pub use face::{FaceDetector, LandmarkPredictor};
pub use progress::{NoProgress, TrainingEvent, TrainingProgress};
