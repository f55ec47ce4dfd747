//! Fixed-shape buffers produced by the feature pipeline.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Side length of the square network input.
pub const IMAGE_SIZE: usize = 128;
/// Colour channels of the network input.
pub const IMAGE_CHANNELS: usize = 3;

const IMAGE_LEN: usize = IMAGE_CHANNELS * IMAGE_SIZE * IMAGE_SIZE;

/// A `3 x 128 x 128` channel-first image with values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    data: Vec<f32>,
}

impl ImageBuffer {
    /// Wraps raw channel-first data.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` does not hold exactly `3 * 128 * 128` values.
    pub fn new(data: Vec<f32>) -> Result<Self> {
        ensure!(
            data.len() == IMAGE_LEN,
            "image buffer must hold {IMAGE_LEN} values, got {}",
            data.len()
        );
        Ok(Self { data })
    }

    /// An all-black image.
    #[must_use]
    pub fn zeros() -> Self {
        Self {
            data: vec![0.0; IMAGE_LEN],
        }
    }

    /// Converts an RGB image that is already `128 x 128` into a channel-first buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is not `128 x 128`.
    pub fn from_rgb(image: &image::RgbImage) -> Result<Self> {
        let size = u32::try_from(IMAGE_SIZE)?;
        ensure!(
            image.width() == size && image.height() == size,
            "expected a {IMAGE_SIZE}x{IMAGE_SIZE} image, got {}x{}",
            image.width(),
            image.height()
        );

        let plane = IMAGE_SIZE * IMAGE_SIZE;
        let mut data = vec![0.0; IMAGE_LEN];
        for (i, pixel) in image.pixels().enumerate() {
            for c in 0..IMAGE_CHANNELS {
                data[c * plane + i] = f32::from(pixel[c]) / 255.0;
            }
        }
        Ok(Self { data })
    }

    /// Channel-first values.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// `[ear_left, ear_right, mouth_opening_ratio, nose_length_ratio]`.
///
/// The all-zero vector is a sentinel for "no face detected" and is not a
/// real measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f32; 4]);

impl FeatureVector {
    /// The "no face detected" sentinel.
    pub const NO_FACE: Self = Self([0.0; 4]);

    /// Builds a vector from the four named ratios.
    #[must_use]
    pub const fn new(ear_left: f32, ear_right: f32, mouth_opening: f32, nose_length: f32) -> Self {
        Self([ear_left, ear_right, mouth_opening, nose_length])
    }

    /// Left eye aspect ratio.
    #[must_use]
    pub const fn ear_left(&self) -> f32 {
        self.0[0]
    }

    /// Right eye aspect ratio.
    #[must_use]
    pub const fn ear_right(&self) -> f32 {
        self.0[1]
    }

    /// Mouth opening ratio.
    #[must_use]
    pub const fn mouth_opening(&self) -> f32 {
        self.0[2]
    }

    /// Nose length ratio.
    #[must_use]
    pub const fn nose_length(&self) -> f32 {
        self.0[3]
    }

    /// Raw values.
    #[must_use]
    pub const fn as_array(&self) -> &[f32; 4] {
        &self.0
    }
}

/// One network input/target triple.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetItem {
    /// Resized, normalized image.
    pub image: ImageBuffer,
    /// Geometric features.
    pub features: FeatureVector,
    /// Binary target, 1.0 for drowsy.
    pub label: f32,
}
