//! Evaluate command - score saved weights on a dataset.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use drowsy_adapters::discover_samples;
use drowsy_core::inference::{get_device, load_safetensors};
use drowsy_core::training::evaluate;
use drowsy_core::{DrowsinessDataset, DrowsinessNet, TrainingConfig};
use tracing::info;

use super::{build_pipeline, load_split, model_store, parse_fraction, DEFAULT_TEST_FRACTION};
use crate::config::AppConfig;
use crate::output::print_summary;

/// Arguments for the evaluate command.
#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Dataset root containing `Drowsy/` and `Non Drowsy/`
    #[arg(value_name = "DATASET_DIR")]
    pub dataset: PathBuf,

    /// Classifier weights written by `drowsy train --save-weights`
    #[arg(long, value_name = "FILE")]
    pub weights: PathBuf,

    /// Evaluate every sample instead of the held-out split
    #[arg(long)]
    pub all: bool,

    /// Seed used for the split [default: 42]
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fraction of samples held out [default: 0.2]
    #[arg(long, value_parser = parse_fraction)]
    pub test_fraction: Option<f64>,

    /// Samples per forward pass [default: 32]
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Only print the accuracy line
    #[arg(short, long)]
    pub quiet: bool,

    /// Directory holding the face model weights
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,
}

impl EvaluateArgs {
    /// Fill unset arguments from the config file.
    #[must_use]
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        args.seed = args.seed.or(config.training.seed);
        args.test_fraction = args.test_fraction.or(config.training.test_fraction);
        args.batch_size = args.batch_size.or(config.training.batch_size);
        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }
        args
    }
}

/// Run the evaluate command.
pub fn run(args: &EvaluateArgs) -> Result<()> {
    let defaults = TrainingConfig::default();
    let batch_size = args.batch_size.unwrap_or(defaults.batch_size);
    anyhow::ensure!(batch_size > 0, "batch size must be at least 1");

    let samples = if args.all {
        discover_samples(&args.dataset)
            .with_context(|| format!("Failed to read dataset {}", args.dataset.display()))?
    } else {
        let fraction = args.test_fraction.unwrap_or(DEFAULT_TEST_FRACTION);
        load_split(&args.dataset, fraction, args.seed.unwrap_or(defaults.seed))?.1
    };
    info!("Evaluating {} samples", samples.len());

    let device = get_device();
    let vb = load_safetensors(&args.weights, &device)?;
    let model = DrowsinessNet::new(vb)
        .with_context(|| format!("Invalid classifier weights: {}", args.weights.display()))?;

    let store = model_store(args.models_dir.as_ref());
    let pipeline = build_pipeline(&store, &device, false)?;
    let dataset = DrowsinessDataset::from_samples(samples, pipeline);

    let evaluation = evaluate(&model, &dataset, batch_size, &device)?;
    print_summary(&evaluation, args.quiet);
    Ok(())
}
