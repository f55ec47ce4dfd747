//! 68-point facial landmark regressor.
//!
//! A plain CNN over a 112x112 grayscale face crop. Four conv stages
//! (1 -> 32 -> 64 -> 128 -> 128, each 3x3 + ReLU + 2x2 max pool) reduce the
//! crop to 128 x 7 x 7, followed by two dense layers that regress 136
//! sigmoid-squashed coordinates relative to the crop.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use anyhow::{ensure, Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, linear, Conv2d, Conv2dConfig, Linear, VarBuilder};
use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::domain::{FaceBox, Landmarks, Point, LANDMARK_COUNT};
use crate::ports::LandmarkPredictor;

/// Side length of the face crop fed to the network.
pub const INPUT_SIZE: usize = 112;

const CHANNELS: [usize; 5] = [1, 32, 64, 128, 128];
const HIDDEN: usize = 256;

/// Candle landmark predictor.
pub struct LandmarkNet {
    convs: Vec<Conv2d>,
    fc1: Linear,
    fc2: Linear,
    device: Device,
}

impl LandmarkNet {
    /// Builds the network from weights named `conv{1..4}`, `fc1` and `fc2`.
    ///
    /// # Errors
    ///
    /// Returns an error if a weight is missing or has the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let cfg = Conv2dConfig {
            padding: 1,
            ..Conv2dConfig::default()
        };
        let convs = CHANNELS
            .windows(2)
            .enumerate()
            .map(|(i, pair)| conv2d(pair[0], pair[1], 3, cfg, vb.pp(format!("conv{}", i + 1))))
            .collect::<candle_core::Result<Vec<_>>>()?;

        let side = INPUT_SIZE >> CHANNELS.len().saturating_sub(1);
        let fc1 = linear(CHANNELS[4] * side * side, HIDDEN, vb.pp("fc1"))?;
        let fc2 = linear(HIDDEN, LANDMARK_COUNT * 2, vb.pp("fc2"))?;

        Ok(Self {
            convs,
            fc1,
            fc2,
            device: vb.device().clone(),
        })
    }

    /// Crops `face` out of `gray` and returns a `(1, 1, 112, 112)` tensor in `[0, 1]`.
    fn crop_input(&self, gray: &GrayImage, face: &FaceBox) -> Result<Tensor> {
        let x = face.x.min(gray.width());
        let y = face.y.min(gray.height());
        let width = face.right().min(gray.width()).saturating_sub(x);
        let height = face.bottom().min(gray.height()).saturating_sub(y);
        ensure!(
            width > 0 && height > 0,
            "face box {face:?} lies outside the {}x{} image",
            gray.width(),
            gray.height()
        );

        let side = INPUT_SIZE as u32;
        let crop = imageops::crop_imm(gray, x, y, width, height).to_image();
        let resized = imageops::resize(&crop, side, side, FilterType::Triangle);

        let data: Vec<f32> = resized
            .into_raw()
            .into_iter()
            .map(|v| f32::from(v) / 255.0)
            .collect();
        Tensor::from_vec(data, (1, 1, INPUT_SIZE, INPUT_SIZE), &self.device)
            .context("Failed to build landmark input")
    }

    /// Returns `(1, 136)` normalized `x0, y0, x1, y1, ...` coordinates.
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let mut h = x.clone();
        for conv in &self.convs {
            h = conv.forward(&h)?.relu()?.max_pool2d(2)?;
        }
        let h = self.fc1.forward(&h.flatten_from(1)?)?.relu()?;
        candle_nn::ops::sigmoid(&self.fc2.forward(&h)?)
    }
}

impl LandmarkPredictor for LandmarkNet {
    fn predict(&self, gray: &GrayImage, face: &FaceBox) -> Result<Landmarks> {
        let input = self.crop_input(gray, face)?;
        let coords = self.forward(&input)?.flatten_all()?.to_vec1::<f32>()?;

        let (fx, fy) = (face.x as f32, face.y as f32);
        let (fw, fh) = (face.width as f32, face.height as f32);
        let points: Vec<Point> = coords
            .chunks_exact(2)
            .map(|xy| {
                Point::new(
                    (fx + xy[0] * fw).round() as i32,
                    (fy + xy[1] * fh).round() as i32,
                )
            })
            .collect();
        Landmarks::from_slice(&points)
    }
}
