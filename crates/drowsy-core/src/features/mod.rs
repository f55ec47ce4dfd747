//! Hand-engineered facial features and the per-sample transform.

pub mod geometry;
mod pipeline;

pub use geometry::{eye_aspect_ratio, mouth_opening_ratio, nose_length_ratio};
pub use pipeline::{extract_features, FeatureCache, FeaturePipeline};
