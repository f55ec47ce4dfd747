//! Epoch loop.

use anyhow::{ensure, Context, Result};
use candle_core::Device;
use candle_nn::{Optimizer, VarMap};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

use super::config::TrainingConfig;
use super::loss::binary_cross_entropy;
use super::optim::{Adam, ParamsAdam};
use crate::dataset::DrowsinessDataset;
use crate::model::Classifier;
use crate::ports::{TrainingEvent, TrainingProgress};

/// Per-epoch record of a training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrainingHistory {
    /// Mean batch loss of each epoch, in order.
    pub epoch_losses: Vec<f32>,
}

impl TrainingHistory {
    /// Mean loss of the last epoch.
    #[must_use]
    pub fn final_loss(&self) -> Option<f32> {
        self.epoch_losses.last().copied()
    }
}

/// Splits `0..len` into batches of at most `batch_size` indices.
///
/// With an RNG the order is shuffled first; without one it is sequential.
/// A `batch_size` of zero is treated as one.
#[must_use]
pub fn batch_indices(len: usize, batch_size: usize, rng: Option<&mut StdRng>) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..len).collect();
    if let Some(rng) = rng {
        order.shuffle(rng);
    }
    order.chunks(batch_size.max(1)).map(<[usize]>::to_vec).collect()
}

/// Trains `model` in place by updating the variables in `varmap`.
///
/// Every epoch visits all samples in a freshly shuffled order, takes one Adam
/// step per batch and records the mean batch loss. There is no early
/// stopping and any error aborts the run.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the dataset is empty,
/// or loading, the forward pass or the optimizer step fails.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn train<C: Classifier + ?Sized>(
    model: &C,
    varmap: &VarMap,
    dataset: &DrowsinessDataset,
    config: &TrainingConfig,
    device: &Device,
    progress: &dyn TrainingProgress,
) -> Result<TrainingHistory> {
    config.validate()?;
    ensure!(!dataset.is_empty(), "cannot train on an empty dataset");

    let params = ParamsAdam {
        lr: config.learning_rate,
        weight_decay: config.weight_decay,
        ..ParamsAdam::default()
    };
    let mut optimizer =
        Adam::new(varmap.all_vars(), params).context("Failed to create optimizer")?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut history = TrainingHistory::default();

    info!(
        "Training on {} samples for {} epochs (batch size {})",
        dataset.len(),
        config.epochs,
        config.batch_size
    );

    for epoch in 1..=config.epochs {
        let batches = batch_indices(dataset.len(), config.batch_size, Some(&mut rng));
        progress.on_event(TrainingEvent::EpochStarted {
            epoch,
            epochs: config.epochs,
            batches: batches.len(),
        });

        let mut running_loss = 0.0_f64;
        for (batch_idx, indices) in batches.iter().enumerate() {
            let batch = dataset.batch(indices, device)?;
            let probs = model.probabilities(&batch.images, &batch.features)?;
            let loss = binary_cross_entropy(&probs, &batch.labels)?;
            optimizer
                .backward_step(&loss)
                .with_context(|| format!("Optimizer step failed in epoch {epoch}"))?;

            let loss = loss.to_scalar::<f32>()?;
            running_loss += f64::from(loss);
            debug!("Epoch {epoch} batch {batch_idx}: loss {loss:.4}");
            progress.on_event(TrainingEvent::BatchCompleted {
                epoch,
                batch: batch_idx,
                loss,
            });
        }

        let mean_loss = (running_loss / batches.len() as f64) as f32;
        info!("Epoch {epoch}/{}, Loss: {mean_loss:.4}", config.epochs);
        history.epoch_losses.push(mean_loss);
        progress.on_event(TrainingEvent::EpochCompleted { epoch, mean_loss });
    }

    progress.on_event(TrainingEvent::Finished {
        epochs: config.epochs,
        final_loss: history.final_loss().unwrap_or_default(),
    });
    Ok(history)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use candle_core::{DType, Module, Tensor};
    use candle_nn::{linear, Linear, VarBuilder};
    use image::{GrayImage, Rgb, RgbImage};

    use super::*;
    use crate::domain::{FaceBox, Landmarks, Point};
    use crate::features::FeaturePipeline;
    use crate::ports::{FaceDetector, LandmarkPredictor};

    /// Logistic regression over the feature vector only.
    struct FeatureLogit(Linear);

    impl Classifier for FeatureLogit {
        fn probabilities(&self, _images: &Tensor, features: &Tensor) -> candle_core::Result<Tensor> {
            candle_nn::ops::sigmoid(&self.0.forward(features)?)
        }
    }

    struct OneFace;

    impl FaceDetector for OneFace {
        fn detect(&self, _gray: &GrayImage) -> Result<Vec<FaceBox>> {
            Ok(vec![FaceBox {
                x: 10,
                y: 10,
                width: 100,
                height: 100,
                score: 0.99,
            }])
        }
    }

    struct WideEyes;

    impl LandmarkPredictor for WideEyes {
        fn predict(&self, _gray: &GrayImage, _face: &FaceBox) -> Result<Landmarks> {
            let mut points = [Point::new(0, 0); 68];
            for (i, p) in points.iter_mut().enumerate() {
                *p = Point::new(i32::try_from(i).unwrap(), i32::try_from(i % 7).unwrap());
            }
            Ok(Landmarks::new(points))
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<TrainingEvent>>);

    impl TrainingProgress for Recorder {
        fn on_event(&self, event: TrainingEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn write_images(dir: &std::path::Path, n: usize) -> Vec<PathBuf> {
        (0..n)
            .map(|i| {
                let path = dir.join(format!("face_{i}.png"));
                let shade = u8::try_from(i * 40).unwrap();
                RgbImage::from_pixel(32, 32, Rgb([shade, shade, shade]))
                    .save(&path)
                    .unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_batch_indices_sequential() {
        let batches = batch_indices(5, 2, None);
        assert_eq!(batches, vec![vec![0, 1], vec![2, 3], vec![4]]);
        assert!(batch_indices(0, 4, None).is_empty());
    }

    #[test]
    fn test_batch_indices_shuffle_is_seeded_permutation() {
        let a = batch_indices(20, 8, Some(&mut StdRng::seed_from_u64(7)));
        let b = batch_indices(20, 8, Some(&mut StdRng::seed_from_u64(7)));
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);

        let mut all: Vec<usize> = a.into_iter().flatten().collect();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_train_records_each_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_images(dir.path(), 3);
        let labels = vec!["Drowsy".into(), "Non Drowsy".into(), "Drowsy".into()];
        let pipeline = FeaturePipeline::new(Arc::new(OneFace), Arc::new(WideEyes));
        let dataset = DrowsinessDataset::new(paths, labels, pipeline).unwrap();

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = FeatureLogit(linear(4, 1, vb).unwrap());

        let config = TrainingConfig {
            epochs: 3,
            batch_size: 2,
            ..TrainingConfig::default()
        };
        let recorder = Recorder::default();
        let history = train(&model, &varmap, &dataset, &config, &Device::Cpu, &recorder).unwrap();

        assert_eq!(history.epoch_losses.len(), 3);
        assert!(history.epoch_losses.iter().all(|l| l.is_finite() && *l > 0.0));

        let events = recorder.0.into_inner().unwrap();
        // Per epoch: start, two batches, end; then finished
        assert_eq!(events.len(), 3 * 4 + 1);
        assert_eq!(
            events[0],
            TrainingEvent::EpochStarted {
                epoch: 1,
                epochs: 3,
                batches: 2
            }
        );
        assert!(matches!(
            events.last(),
            Some(TrainingEvent::Finished { epochs: 3, .. })
        ));
    }

    #[test]
    fn test_train_rejects_empty_dataset() {
        let pipeline = FeaturePipeline::new(Arc::new(OneFace), Arc::new(WideEyes));
        let dataset = DrowsinessDataset::new(vec![], vec![], pipeline).unwrap();
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = FeatureLogit(linear(4, 1, vb).unwrap());

        let err = train(
            &model,
            &varmap,
            &dataset,
            &TrainingConfig::default(),
            &Device::Cpu,
            &crate::ports::NoProgress,
        )
        .unwrap_err();
        assert!(err.to_string().contains("empty dataset"));
    }
}
