//! CLI command definitions and handlers.

pub mod dataset;
pub mod evaluate;
pub mod features;
pub mod models;
pub mod train;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use candle_core::Device;
use clap::{Parser, Subcommand};
use drowsy_adapters::{discover_samples, train_test_split, ModelStore};
use drowsy_core::{FeatureCache, FeaturePipeline, Sample};
use tracing::{debug, info};

/// Drowsy - driver drowsiness classification from face images
#[derive(Parser)]
#[command(name = "drowsy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Train the classifier on a dataset and evaluate it on a held-out split
    Train(train::TrainArgs),
    /// Evaluate saved weights on a dataset
    Evaluate(evaluate::EvaluateArgs),
    /// Print landmark features for images as JSON lines
    Features(features::FeaturesArgs),
    /// Summarize a dataset and its train/test split
    Dataset(dataset::DatasetArgs),
    /// Manage ML models
    Models(models::ModelsArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command completed.
    Success = 0,
    /// Command failed.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}

/// Default held-out fraction.
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Parse and validate a split fraction (strictly between 0 and 1).
fn parse_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!("{value} is not strictly between 0 and 1"))
    }
}

/// Model store for an optional directory override.
fn model_store(dir: Option<&PathBuf>) -> ModelStore {
    dir.map_or_else(ModelStore::default, |dir| {
        debug!("Using custom models directory: {}", dir.display());
        ModelStore::new(dir)
    })
}

/// Loads both face models and wires them into a feature pipeline.
fn build_pipeline(store: &ModelStore, device: &Device, cache: bool) -> Result<FeaturePipeline> {
    let detector = store.detector(device)?;
    let predictor = store.predictor(device)?;
    let pipeline = FeaturePipeline::new(Arc::new(detector), Arc::new(predictor));
    Ok(if cache {
        debug!("Feature cache enabled");
        pipeline.with_cache(Arc::new(FeatureCache::new()))
    } else {
        pipeline
    })
}

/// Discovers the dataset and splits it into `(train, test)`.
fn load_split(root: &Path, test_fraction: f64, seed: u64) -> Result<(Vec<Sample>, Vec<Sample>)> {
    let samples = discover_samples(root)
        .with_context(|| format!("Failed to read dataset {}", root.display()))?;
    info!("Discovered {} samples in {}", samples.len(), root.display());
    train_test_split(samples, test_fraction, seed)
}
