//! Drowsy Adapters - filesystem and model-store adapters.
//!
//! This crate provides:
//! - Dataset discovery over `Drowsy/` and `Non Drowsy/` folders
//! - Seeded train/test splitting
//! - Resolution and loading of detector and landmark weights

pub mod fs;
pub mod models;
pub mod split;

pub use fs::{collect_images, discover_samples, is_supported_image};
pub use models::{ModelStatus, ModelStore};
pub use split::train_test_split;
