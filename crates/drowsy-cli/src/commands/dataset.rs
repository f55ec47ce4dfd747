//! Dataset command - inspect class balance and the train/test split.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use drowsy_adapters::{discover_samples, train_test_split};
use drowsy_core::domain::{binarize_label, DROWSY_LABEL, NON_DROWSY_LABEL};
use drowsy_core::TrainingConfig;

use super::{parse_fraction, DEFAULT_TEST_FRACTION};
use crate::config::AppConfig;

/// Arguments for the dataset command.
#[derive(Args, Debug, Clone)]
pub struct DatasetArgs {
    /// Dataset root containing `Drowsy/` and `Non Drowsy/`
    #[arg(value_name = "DATASET_DIR")]
    pub dataset: PathBuf,

    /// Seed for the shuffle [default: 42]
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fraction of samples held out [default: 0.2]
    #[arg(long, value_parser = parse_fraction)]
    pub test_fraction: Option<f64>,

    /// List the first N samples in shuffled order
    #[arg(long, value_name = "N")]
    pub head: Option<usize>,
}

impl DatasetArgs {
    /// Fill unset arguments from the config file.
    #[must_use]
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        args.seed = args.seed.or(config.training.seed);
        args.test_fraction = args.test_fraction.or(config.training.test_fraction);
        args
    }
}

/// Run the dataset command.
pub fn run(args: &DatasetArgs) -> Result<()> {
    let samples = discover_samples(&args.dataset)
        .with_context(|| format!("Failed to read dataset {}", args.dataset.display()))?;

    let drowsy = samples.iter().filter(|s| s.label == DROWSY_LABEL).count();
    println!("Dataset: {}", args.dataset.display());
    println!("  {DROWSY_LABEL}: {drowsy}");
    println!("  {NON_DROWSY_LABEL}: {}", samples.len() - drowsy);
    println!("  Total: {}", samples.len());

    let fraction = args.test_fraction.unwrap_or(DEFAULT_TEST_FRACTION);
    let seed = args.seed.unwrap_or(TrainingConfig::default().seed);
    let (train, test) = train_test_split(samples, fraction, seed)?;
    println!();
    println!("Split (test fraction {fraction}, seed {seed}):");
    println!("  Train: {}", train.len());
    println!("  Test: {}", test.len());

    if let Some(n) = args.head {
        println!();
        // Test samples are the head of the shuffled order
        for sample in test.iter().chain(&train).take(n) {
            println!(
                "{} {} ({})",
                binarize_label(&sample.label),
                sample.path.display(),
                sample.label
            );
        }
    }

    Ok(())
}
