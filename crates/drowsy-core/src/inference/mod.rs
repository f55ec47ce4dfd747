//! Candle backends for the face ports.
//!
//! - [`BlazeFace`]: short-range face detector
//! - [`LandmarkNet`]: 68-point landmark regressor

mod blazeface;
mod device;
mod landmarks;
mod loader;

pub use blazeface::{BlazeFace, INPUT_SIZE as BLAZEFACE_INPUT_SIZE};
pub use device::get_device;
pub use landmarks::{LandmarkNet, INPUT_SIZE as LANDMARK_INPUT_SIZE};
pub use loader::load_safetensors;
