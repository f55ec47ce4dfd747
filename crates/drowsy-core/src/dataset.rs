//! Lazy indexed dataset over labelled image paths.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use candle_core::{Device, Tensor};

use crate::domain::{DatasetItem, Sample, IMAGE_CHANNELS, IMAGE_SIZE};
use crate::features::FeaturePipeline;

/// Indexed collection of samples that runs the feature pipeline on access.
///
/// Nothing is computed up front and nothing is retained between calls to
/// [`get`](Self::get) unless the pipeline has a cache attached. Access order
/// is the caller's business.
#[derive(Clone)]
pub struct DrowsinessDataset {
    image_paths: Vec<PathBuf>,
    labels: Vec<String>,
    pipeline: FeaturePipeline,
}

impl DrowsinessDataset {
    /// Creates a dataset from parallel path and label lists.
    ///
    /// # Errors
    ///
    /// Returns an error if the lists differ in length.
    pub fn new(
        image_paths: Vec<PathBuf>,
        labels: Vec<String>,
        pipeline: FeaturePipeline,
    ) -> Result<Self> {
        ensure!(
            image_paths.len() == labels.len(),
            "got {} image paths but {} labels",
            image_paths.len(),
            labels.len()
        );
        Ok(Self {
            image_paths,
            labels,
            pipeline,
        })
    }

    /// Creates a dataset from samples.
    #[must_use]
    pub fn from_samples(samples: Vec<Sample>, pipeline: FeaturePipeline) -> Self {
        let (image_paths, labels) = samples.into_iter().map(|s| (s.path, s.label)).unzip();
        Self {
            image_paths,
            labels,
            pipeline,
        }
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.image_paths.len()
    }

    /// Returns true if the dataset has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.image_paths.is_empty()
    }

    /// Path and raw label of sample `idx`.
    #[must_use]
    pub fn sample(&self, idx: usize) -> Option<(&Path, &str)> {
        Some((
            self.image_paths.get(idx)?.as_path(),
            self.labels.get(idx)?.as_str(),
        ))
    }

    /// Computes item `idx` from its image file.
    ///
    /// # Errors
    ///
    /// Returns an error if `idx` is out of range or the pipeline fails.
    pub fn get(&self, idx: usize) -> Result<DatasetItem> {
        let (path, label) = self
            .sample(idx)
            .with_context(|| format!("index {idx} out of range for dataset of {}", self.len()))?;
        self.pipeline.process(path, label)
    }

    /// Loads the given indices and stacks them into a batch.
    ///
    /// # Errors
    ///
    /// Returns an error if any item fails to load.
    pub fn batch(&self, indices: &[usize], device: &Device) -> Result<Batch> {
        let items = indices
            .iter()
            .map(|&i| self.get(i))
            .collect::<Result<Vec<_>>>()?;
        Batch::collate(&items, device)
    }
}

/// Stacked network inputs and targets.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Images, shape `(B, 3, 128, 128)`.
    pub images: Tensor,
    /// Feature vectors, shape `(B, 4)`.
    pub features: Tensor,
    /// Targets, shape `(B, 1)`.
    pub labels: Tensor,
}

impl Batch {
    /// Stacks items into tensors on `device`.
    ///
    /// # Errors
    ///
    /// Returns an error if `items` is empty or tensor creation fails.
    pub fn collate(items: &[DatasetItem], device: &Device) -> Result<Self> {
        ensure!(!items.is_empty(), "cannot collate an empty batch");
        let n = items.len();

        let images: Vec<f32> = items
            .iter()
            .flat_map(|item| item.image.as_slice().iter().copied())
            .collect();
        let features: Vec<f32> = items
            .iter()
            .flat_map(|item| *item.features.as_array())
            .collect();
        let labels: Vec<f32> = items.iter().map(|item| item.label).collect();

        Ok(Self {
            images: Tensor::from_vec(images, (n, IMAGE_CHANNELS, IMAGE_SIZE, IMAGE_SIZE), device)
                .context("Failed to create image batch")?,
            features: Tensor::from_vec(features, (n, 4), device)
                .context("Failed to create feature batch")?,
            labels: Tensor::from_vec(labels, (n, 1), device)
                .context("Failed to create label batch")?,
        })
    }

    /// Number of items in the batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the label tensor is malformed.
    pub fn len(&self) -> Result<usize> {
        Ok(self.labels.dim(0)?)
    }
}
