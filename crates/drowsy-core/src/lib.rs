//! Drowsy Core - driver drowsiness classification
//!
//! Domain types, geometric facial features, the lazy dataset, the fusion CNN
//! and its training and evaluation loops. Face detection and landmark
//! prediction sit behind the [`ports`] traits; [`inference`] provides candle
//! implementations of both.

pub mod dataset;
pub mod domain;
pub mod features;
pub mod inference;
pub mod model;
pub mod ports;
pub mod training;

pub use dataset::{Batch, DrowsinessDataset};
pub use domain::{DatasetItem, FaceBox, FeatureVector, ImageBuffer, Landmarks, Point, Sample};
pub use features::{FeatureCache, FeaturePipeline};
pub use model::{Classifier, DrowsinessNet};
pub use ports::{FaceDetector, LandmarkPredictor, TrainingEvent, TrainingProgress};
pub use training::{ConfusionMatrix, Evaluation, TrainingConfig, TrainingHistory};
