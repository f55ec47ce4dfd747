//! Fusion CNN for drowsiness classification.
//!
//! A small convolutional image branch and a dense feature branch are
//! concatenated and classified by two fully-connected layers.

use anyhow::Result;
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{conv2d, linear, Conv2d, Conv2dConfig, Linear, VarBuilder, VarMap};

use crate::domain::IMAGE_SIZE;

/// Width of the image branch output.
const IMAGE_FEATURES: usize = 512;
/// Width of the geometric feature branch output.
const GEOMETRY_FEATURES: usize = 16;
/// Width of the fused hidden layer.
const HIDDEN: usize = 256;

/// Anything that maps a batch of images and features to drowsiness probabilities.
pub trait Classifier {
    /// Returns probabilities of shape `(B, 1)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the forward pass fails.
    fn probabilities(&self, images: &Tensor, features: &Tensor) -> candle_core::Result<Tensor>;
}

/// Convolutional image branch.
///
/// 128x128 -> 64x64 -> 32x32 -> 16x16, flattened to 128 * 16 * 16 = 32768
/// and projected to 512 units.
struct ImageBranch {
    conv1: Conv2d,
    conv2: Conv2d,
    conv3: Conv2d,
    fc_image: Linear,
}

impl ImageBranch {
    fn new(vb: &VarBuilder) -> Result<Self> {
        let cfg = Conv2dConfig {
            padding: 1,
            ..Conv2dConfig::default()
        };

        // Conv layer 1: 3 -> 32 channels, 3x3 kernel
        let conv1 = conv2d(3, 32, 3, cfg, vb.pp("conv1"))?;
        // Conv layer 2: 32 -> 64 channels, 3x3 kernel
        let conv2 = conv2d(32, 64, 3, cfg, vb.pp("conv2"))?;
        // Conv layer 3: 64 -> 128 channels, 3x3 kernel
        let conv3 = conv2d(64, 128, 3, cfg, vb.pp("conv3"))?;

        let side = IMAGE_SIZE / 2 / 2 / 2;
        let fc_image = linear(128 * side * side, IMAGE_FEATURES, vb.pp("fc_image"))?;

        Ok(Self {
            conv1,
            conv2,
            conv3,
            fc_image,
        })
    }
}

impl Module for ImageBranch {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let x = self.conv1.forward(x)?.relu()?.max_pool2d(2)?;
        let x = self.conv2.forward(&x)?.relu()?.max_pool2d(2)?;
        let x = self.conv3.forward(&x)?.relu()?.max_pool2d(2)?;
        let x = x.flatten_from(1)?;
        self.fc_image.forward(&x)?.relu()
    }
}

/// Drowsiness classifier fusing pixels with geometric ratios.
///
/// Input: images `(B, 3, 128, 128)` in `[0, 1]` and features `(B, 4)`.
/// Output: probability of drowsiness `(B, 1)`.
pub struct DrowsinessNet {
    image: ImageBranch,
    fc_features: Linear,
    fc1: Linear,
    fc2: Linear,
}

impl DrowsinessNet {
    /// Creates the network from weights.
    ///
    /// Works with both a `VarMap`-backed builder for training and a
    /// safetensors-backed builder for inference.
    ///
    /// # Errors
    ///
    /// Returns an error if weights are missing or have the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let image = ImageBranch::new(&vb)?;
        let fc_features = linear(4, GEOMETRY_FEATURES, vb.pp("fc_features"))?;
        let fc1 = linear(IMAGE_FEATURES + GEOMETRY_FEATURES, HIDDEN, vb.pp("fc1"))?;
        let fc2 = linear(HIDDEN, 1, vb.pp("fc2"))?;

        Ok(Self {
            image,
            fc_features,
            fc1,
            fc2,
        })
    }

    /// Creates a freshly initialized network and the variables backing it.
    ///
    /// # Errors
    ///
    /// Returns an error if variable initialization fails.
    pub fn trainable(device: &Device) -> Result<(Self, VarMap)> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let model = Self::new(vb)?;
        Ok((model, varmap))
    }

    /// Runs the forward pass.
    ///
    /// # Errors
    ///
    /// Returns an error if input shapes do not match the network.
    pub fn forward(&self, images: &Tensor, features: &Tensor) -> candle_core::Result<Tensor> {
        let image_features = self.image.forward(images)?;
        let extra_features = self.fc_features.forward(features)?.relu()?;

        let combined = Tensor::cat(&[&image_features, &extra_features], 1)?;
        let combined = self.fc1.forward(&combined)?.relu()?;

        candle_nn::ops::sigmoid(&self.fc2.forward(&combined)?)
    }
}

impl Classifier for DrowsinessNet {
    fn probabilities(&self, images: &Tensor, features: &Tensor) -> candle_core::Result<Tensor> {
        self.forward(images, features)
    }
}
