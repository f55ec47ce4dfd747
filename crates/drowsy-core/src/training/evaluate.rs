//! Evaluation pass: thresholded predictions, accuracy and confusion matrix.

use anyhow::{ensure, Result};
use candle_core::Device;
use serde::Serialize;
use tracing::debug;

use super::train::batch_indices;
use crate::dataset::DrowsinessDataset;
use crate::model::Classifier;

/// Probabilities strictly above this are predicted drowsy.
pub const DECISION_THRESHOLD: f32 = 0.5;

/// Outcome of an evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Correct predictions over dataset length.
    pub accuracy: f64,
    /// Thresholded predictions (0.0 or 1.0), in dataset order.
    pub predictions: Vec<f32>,
    /// Binarized labels, in dataset order.
    pub labels: Vec<f32>,
}

impl Evaluation {
    /// Confusion matrix of this evaluation.
    #[must_use]
    pub fn confusion_matrix(&self) -> ConfusionMatrix {
        ConfusionMatrix::from_predictions(&self.predictions, &self.labels)
    }
}

/// Binary confusion matrix.
///
/// Rows are actual classes, columns predicted classes, both ordered
/// `[Not Drowsy, Drowsy]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    /// Non-drowsy samples predicted non-drowsy.
    pub true_negatives: usize,
    /// Non-drowsy samples predicted drowsy.
    pub false_positives: usize,
    /// Drowsy samples predicted non-drowsy.
    pub false_negatives: usize,
    /// Drowsy samples predicted drowsy.
    pub true_positives: usize,
}

impl ConfusionMatrix {
    /// Class names in row/column order.
    pub const CLASSES: [&'static str; 2] = ["Not Drowsy", "Drowsy"];

    /// Counts prediction/label pairs. Values above 0.5 count as drowsy.
    #[must_use]
    pub fn from_predictions(predictions: &[f32], labels: &[f32]) -> Self {
        let mut matrix = Self::default();
        for (&predicted, &actual) in predictions.iter().zip(labels) {
            match (actual > 0.5, predicted > 0.5) {
                (false, false) => matrix.true_negatives += 1,
                (false, true) => matrix.false_positives += 1,
                (true, false) => matrix.false_negatives += 1,
                (true, true) => matrix.true_positives += 1,
            }
        }
        matrix
    }

    /// Counts as `[[tn, fp], [fn, tp]]`.
    #[must_use]
    pub const fn rows(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negatives, self.false_positives],
            [self.false_negatives, self.true_positives],
        ]
    }

    /// Total number of counted pairs.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }
}

/// Fraction of matching prediction/label pairs over `dataset_len`.
///
/// Returns 0.0 when `dataset_len` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn accuracy(predictions: &[f32], labels: &[f32], dataset_len: usize) -> f64 {
    if dataset_len == 0 {
        return 0.0;
    }
    let correct = predictions
        .iter()
        .zip(labels)
        .filter(|(&p, &l)| (p > 0.5) == (l > 0.5))
        .count();
    correct as f64 / dataset_len as f64
}

/// Runs `model` over `dataset` in order and scores the predictions.
///
/// No gradients are taken: outputs are copied to host memory and never
/// reach a backward pass.
///
/// # Errors
///
/// Returns an error if the dataset is empty, an item fails to load or the
/// forward pass fails.
pub fn evaluate<C: Classifier + ?Sized>(
    model: &C,
    dataset: &DrowsinessDataset,
    batch_size: usize,
    device: &Device,
) -> Result<Evaluation> {
    ensure!(!dataset.is_empty(), "cannot evaluate an empty dataset");
    ensure!(batch_size > 0, "batch_size must be at least 1");

    let mut predictions = Vec::with_capacity(dataset.len());
    let mut labels = Vec::with_capacity(dataset.len());

    for indices in batch_indices(dataset.len(), batch_size, None) {
        let batch = dataset.batch(&indices, device)?;
        let probs = model
            .probabilities(&batch.images, &batch.features)?
            .flatten_all()?
            .to_vec1::<f32>()?;

        predictions.extend(
            probs
                .into_iter()
                .map(|p| if p > DECISION_THRESHOLD { 1.0 } else { 0.0 }),
        );
        labels.extend(batch.labels.flatten_all()?.to_vec1::<f32>()?);
    }

    let accuracy = accuracy(&predictions, &labels, dataset.len());
    debug!("Evaluated {} samples, accuracy {accuracy:.4}", dataset.len());

    Ok(Evaluation {
        accuracy,
        predictions,
        labels,
    })
}
