//! `BlazeFace` short-range face detector.
//!
//! Architecture from "`BlazeFace`: Sub-millisecond Neural Face Detection on
//! Mobile GPUs", with batch norm folded into the convolution biases.
//! 896 anchors over a 16x16 and an 8x8 grid.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, Conv2d, Conv2dConfig, VarBuilder};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use tracing::trace;

use crate::domain::FaceBox;
use crate::ports::FaceDetector;

/// Side length of the detector input.
pub const INPUT_SIZE: usize = 128;

const NUM_ANCHORS: usize = 896;
const ANCHORS_16: usize = 512;
const ANCHORS_8: usize = 384;

/// Default minimum detection score.
const DEFAULT_SCORE_THRESHOLD: f32 = 0.75;

/// Overlap above which the weaker of two boxes is suppressed.
const NMS_THRESHOLD: f32 = 0.3;

/// `(in, out, stride)` for every block of the 16x16 backbone.
const BACKBONE_16: [(usize, usize, usize); 11] = [
    (24, 24, 1),
    (24, 28, 1),
    (28, 32, 2),
    (32, 36, 1),
    (36, 42, 1),
    (42, 48, 2),
    (48, 56, 1),
    (56, 64, 1),
    (64, 72, 1),
    (72, 80, 1),
    (80, 88, 1),
];

/// `(in, out, stride)` for every block of the 8x8 backbone.
const BACKBONE_8: [(usize, usize, usize); 5] = [
    (88, 96, 2),
    (96, 96, 1),
    (96, 96, 1),
    (96, 96, 1),
    (96, 96, 1),
];

/// Box in normalized `[x_min, y_min, x_max, y_max]` form.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    bbox: [f32; 4],
    score: f32,
}

impl Candidate {
    /// Scales the box to a `width` x `height` image.
    fn to_face_box(self, width: u32, height: u32) -> FaceBox {
        let [x_min, y_min, x_max, y_max] = self.bbox;
        let (w, h) = (width as f32, height as f32);
        let x = (x_min * w).round().max(0.0) as u32;
        let y = (y_min * h).round().max(0.0) as u32;
        let right = (x_max * w).round().clamp(0.0, w) as u32;
        let bottom = (y_max * h).round().clamp(0.0, h) as u32;
        FaceBox {
            x,
            y,
            width: right.saturating_sub(x),
            height: bottom.saturating_sub(y),
            score: self.score,
        }
    }
}

/// Depthwise-separable residual block.
struct BlazeBlock {
    depthwise: Conv2d,
    pointwise: Conv2d,
    channel_pad: usize,
    stride: usize,
}

impl BlazeBlock {
    fn new(in_channels: usize, out_channels: usize, stride: usize, vb: &VarBuilder) -> Result<Self> {
        let depthwise = conv2d(
            in_channels,
            in_channels,
            3,
            Conv2dConfig {
                stride,
                padding: usize::from(stride == 1),
                groups: in_channels,
                dilation: 1,
            },
            vb.pp("depthwise"),
        )?;
        let pointwise = conv2d(
            in_channels,
            out_channels,
            1,
            Conv2dConfig::default(),
            vb.pp("pointwise"),
        )?;

        Ok(Self {
            depthwise,
            pointwise,
            channel_pad: out_channels.saturating_sub(in_channels),
            stride,
        })
    }
}

impl Module for BlazeBlock {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let (h, residual) = if self.stride == 2 {
            // Pad right/bottom only, as TFLite "same" does for stride 2
            let padded = x.pad_with_zeros(2, 0, 2)?.pad_with_zeros(3, 0, 2)?;
            (self.depthwise.forward(&padded)?, x.max_pool2d(2)?)
        } else {
            (self.depthwise.forward(x)?, x.clone())
        };
        let h = self.pointwise.forward(&h.relu()?)?;

        let residual = if self.channel_pad > 0 {
            residual.pad_with_zeros(1, 0, self.channel_pad)?
        } else {
            residual
        };
        (h + residual)?.relu()
    }
}

/// Candle `BlazeFace` detector.
pub struct BlazeFace {
    conv0: Conv2d,
    backbone_16: Vec<BlazeBlock>,
    backbone_8: Vec<BlazeBlock>,
    classifier_16: Conv2d,
    regressor_16: Conv2d,
    classifier_8: Conv2d,
    regressor_8: Conv2d,
    anchors: Vec<[f32; 2]>,
    score_threshold: f32,
    device: Device,
}

impl BlazeFace {
    /// Builds the detector from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a weight is missing or has the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let device = vb.device().clone();
        let conv0 = conv2d(
            3,
            24,
            5,
            Conv2dConfig {
                stride: 2,
                ..Conv2dConfig::default()
            },
            vb.pp("conv0"),
        )?;

        let blocks = |config: &[(usize, usize, usize)], prefix: &str| {
            config
                .iter()
                .enumerate()
                .map(|(i, &(c_in, c_out, stride))| {
                    BlazeBlock::new(c_in, c_out, stride, &vb.pp(format!("{prefix}.{i}")))
                })
                .collect::<Result<Vec<_>>>()
        };
        let backbone_16 = blocks(&BACKBONE_16, "backbone1")?;
        let backbone_8 = blocks(&BACKBONE_8, "backbone2")?;

        let head = |c_in, c_out, name: &str| conv2d(c_in, c_out, 1, Conv2dConfig::default(), vb.pp(name));

        Ok(Self {
            conv0,
            backbone_16,
            backbone_8,
            classifier_16: head(88, 2, "classifier_16")?,
            regressor_16: head(88, 32, "regressor_16")?,
            classifier_8: head(96, 6, "classifier_8")?,
            regressor_8: head(96, 96, "regressor_8")?,
            anchors: anchor_centers(),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            device,
        })
    }

    /// Sets the minimum detection score.
    #[must_use]
    pub const fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    /// Converts a grayscale image to a `(1, 3, 128, 128)` tensor in `[-1, 1]`.
    fn preprocess(&self, gray: &GrayImage) -> Result<Tensor> {
        let side = INPUT_SIZE as u32;
        let rgb = DynamicImage::ImageLuma8(gray.clone())
            .resize_exact(side, side, FilterType::Triangle)
            .to_rgb8();

        let data: Vec<f32> = rgb
            .into_raw()
            .into_iter()
            .map(|v| f32::from(v) / 127.5 - 1.0)
            .collect();

        Tensor::from_vec(data, (1, INPUT_SIZE, INPUT_SIZE, 3), &self.device)?
            .permute((0, 3, 1, 2))?
            .contiguous()
            .context("Failed to build detector input")
    }

    /// Returns raw `(scores, regressions)` of shapes `(896, 1)` and `(896, 16)`.
    fn forward(&self, x: &Tensor) -> Result<(Tensor, Tensor)> {
        let x = x.pad_with_zeros(2, 1, 2)?.pad_with_zeros(3, 1, 2)?;
        let mut h = self.conv0.forward(&x)?.relu()?;

        for block in &self.backbone_16 {
            h = block.forward(&h)?;
        }
        let grid_16 = h.clone();
        for block in &self.backbone_8 {
            h = block.forward(&h)?;
        }
        let grid_8 = h;

        let flatten = |t: Tensor, n: usize, width: usize| -> candle_core::Result<Tensor> {
            t.permute((0, 2, 3, 1))?.reshape((n, width))
        };
        let scores = Tensor::cat(
            &[
                flatten(self.classifier_16.forward(&grid_16)?, ANCHORS_16, 1)?,
                flatten(self.classifier_8.forward(&grid_8)?, ANCHORS_8, 1)?,
            ],
            0,
        )?;
        let boxes = Tensor::cat(
            &[
                flatten(self.regressor_16.forward(&grid_16)?, ANCHORS_16, 16)?,
                flatten(self.regressor_8.forward(&grid_8)?, ANCHORS_8, 16)?,
            ],
            0,
        )?;
        Ok((scores, boxes))
    }

    fn decode(&self, scores: &Tensor, boxes: &Tensor) -> Result<Vec<Candidate>> {
        let scores = scores.to_vec2::<f32>()?;
        let boxes = boxes.to_vec2::<f32>()?;
        let scale = INPUT_SIZE as f32;

        let candidates = self
            .anchors
            .iter()
            .zip(scores.iter().zip(&boxes))
            .filter_map(|(&[ax, ay], (score, reg))| {
                let score = sigmoid(score[0]);
                if score < self.score_threshold {
                    return None;
                }
                let cx = ax + reg[0] / scale;
                let cy = ay + reg[1] / scale;
                let (w, h) = (reg[2] / scale, reg[3] / scale);
                Some(Candidate {
                    bbox: [
                        (cx - w / 2.0).clamp(0.0, 1.0),
                        (cy - h / 2.0).clamp(0.0, 1.0),
                        (cx + w / 2.0).clamp(0.0, 1.0),
                        (cy + h / 2.0).clamp(0.0, 1.0),
                    ],
                    score,
                })
            })
            .collect();
        Ok(non_max_suppression(candidates))
    }
}

impl FaceDetector for BlazeFace {
    fn detect(&self, gray: &GrayImage) -> Result<Vec<FaceBox>> {
        let input = self.preprocess(gray)?;
        let (scores, boxes) = self.forward(&input)?;
        let faces: Vec<FaceBox> = self
            .decode(&scores, &boxes)?
            .into_iter()
            .map(|c| c.to_face_box(gray.width(), gray.height()))
            .filter(|face| face.width > 0 && face.height > 0)
            .collect();
        trace!("BlazeFace found {} faces", faces.len());
        Ok(faces)
    }
}

/// Anchor centres: two per cell of the 16x16 grid, then six per cell of the 8x8 grid.
fn anchor_centers() -> Vec<[f32; 2]> {
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);
    for (grid, per_cell) in [(16_u8, 2), (8, 6)] {
        let size = f32::from(grid);
        for y in 0..grid {
            for x in 0..grid {
                let center = [(f32::from(x) + 0.5) / size, (f32::from(y) + 0.5) / size];
                anchors.extend(std::iter::repeat(center).take(per_cell));
            }
        }
    }
    anchors
}

/// Greedy NMS. Output is sorted by score, highest first.
fn non_max_suppression(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.iter().all(|k| iou(&k.bbox, &candidate.bbox) < NMS_THRESHOLD) {
            kept.push(candidate);
        }
    }
    kept
}

/// Intersection over union of two corner-form boxes.
fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let intersection = inter_w * inter_h;

    let area = |r: &[f32; 4]| (r[2] - r[0]) * (r[3] - r[1]);
    let union = area(a) + area(b) - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// Logistic function on a raw classifier score.
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
