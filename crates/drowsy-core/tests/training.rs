//! End-to-end training and evaluation on tiny synthetic datasets.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use drowsy_core::domain::{DROWSY_LABEL, NON_DROWSY_LABEL};
use drowsy_core::inference::load_safetensors;
use drowsy_core::training::{evaluate, train};
use drowsy_core::{
    Classifier, DrowsinessDataset, DrowsinessNet, FeaturePipeline, Sample, TrainingConfig,
};
use drowsy_test_support::{
    DatasetDirBuilder, LandmarkBuilder, MockFaceDetector, MockLandmarkPredictor,
    MockTrainingProgress,
};

/// Predicts drowsy for every sample.
struct AlwaysDrowsy;

impl Classifier for AlwaysDrowsy {
    fn probabilities(&self, images: &Tensor, _features: &Tensor) -> candle_core::Result<Tensor> {
        Tensor::ones((images.dim(0)?, 1), DType::F32, images.device())
    }
}

/// Predicts drowsy exactly when a face was found.
struct FaceFound;

impl Classifier for FaceFound {
    fn probabilities(&self, _images: &Tensor, features: &Tensor) -> candle_core::Result<Tensor> {
        features.narrow(1, 0, 1)?.gt(0.0)?.to_dtype(DType::F32)
    }
}

/// Five bright drowsy faces and five dark non-drowsy images without a face.
fn dataset(dir: &DatasetDirBuilder) -> DrowsinessDataset {
    let samples = dir
        .written()
        .iter()
        .map(|path| {
            let label = if path.parent().unwrap().ends_with(DROWSY_LABEL) {
                DROWSY_LABEL
            } else {
                NON_DROWSY_LABEL
            };
            Sample::new(path.clone(), label)
        })
        .collect();
    let pipeline = FeaturePipeline::new(
        Arc::new(MockFaceDetector::always().bright_only(100)),
        Arc::new(MockLandmarkPredictor::new(LandmarkBuilder::new().build())),
    );
    DrowsinessDataset::from_samples(samples, pipeline)
}

#[test]
fn test_evaluate_perfect_classifier() {
    let dir = DatasetDirBuilder::new().unwrap().balanced(5).unwrap();
    let dataset = dataset(&dir);

    let result = evaluate(&FaceFound, &dataset, 4, &Device::Cpu).unwrap();
    assert_eq!(result.accuracy, 1.0);
    assert_eq!(result.predictions.len(), 10);
    assert_eq!(result.predictions, result.labels);

    let matrix = result.confusion_matrix();
    assert_eq!(matrix.rows(), [[5, 0], [0, 5]]);
}

#[test]
fn test_evaluate_constant_classifier() {
    let dir = DatasetDirBuilder::new().unwrap().balanced(5).unwrap();
    let dataset = dataset(&dir);

    let result = evaluate(&AlwaysDrowsy, &dataset, 3, &Device::Cpu).unwrap();
    assert_eq!(result.accuracy, 0.5);

    let matrix = result.confusion_matrix();
    assert_eq!(matrix.false_positives, 5);
    assert_eq!(matrix.true_positives, 5);
    assert_eq!(matrix.total(), 10);
}

#[test]
fn test_train_then_evaluate_network() {
    let dir = DatasetDirBuilder::new().unwrap().balanced(2).unwrap();
    let dataset = dataset(&dir);
    let device = Device::Cpu;

    let (model, varmap) = DrowsinessNet::trainable(&device).unwrap();
    let config = TrainingConfig {
        epochs: 1,
        batch_size: 2,
        ..TrainingConfig::default()
    };
    let progress = MockTrainingProgress::new();

    let history = train(&model, &varmap, &dataset, &config, &device, &progress).unwrap();

    assert_eq!(history.epoch_losses.len(), 1);
    assert!(history.epoch_losses[0].is_finite());
    assert_eq!(progress.batch_count(), 2);
    assert_eq!(progress.epoch_losses(), history.epoch_losses);
    assert_eq!(progress.finished_epochs(), Some(1));

    let result = evaluate(&model, &dataset, 32, &device).unwrap();
    assert_eq!(result.predictions.len(), 4);
    assert!((0.0..=1.0).contains(&result.accuracy));
    assert!(result.predictions.iter().all(|&p| p == 0.0 || p == 1.0));
}

#[test]
fn test_saved_weights_reload_identically() {
    let dir = DatasetDirBuilder::new().unwrap().balanced(1).unwrap();
    let dataset = dataset(&dir);
    let device = Device::Cpu;

    let (model, varmap) = DrowsinessNet::trainable(&device).unwrap();
    let weights = tempfile::NamedTempFile::new().unwrap();
    varmap.save(weights.path()).unwrap();

    let reloaded = DrowsinessNet::new(load_safetensors(weights.path(), &device).unwrap()).unwrap();

    let batch = dataset.batch(&[0, 1], &device).unwrap();
    let a = model
        .forward(&batch.images, &batch.features)
        .unwrap()
        .flatten_all()
        .unwrap()
        .to_vec1::<f32>()
        .unwrap();
    let b = reloaded
        .forward(&batch.images, &batch.features)
        .unwrap()
        .flatten_all()
        .unwrap()
        .to_vec1::<f32>()
        .unwrap();
    assert_eq!(a, b);
}
