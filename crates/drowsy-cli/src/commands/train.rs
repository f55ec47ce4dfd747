//! Train command - fit the classifier and report held-out accuracy.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use drowsy_core::inference::get_device;
use drowsy_core::training::{evaluate, train};
use drowsy_core::{DrowsinessDataset, DrowsinessNet, TrainingConfig};
use tracing::info;

use super::{build_pipeline, load_split, model_store, parse_fraction, DEFAULT_TEST_FRACTION};
use crate::config::AppConfig;
use crate::output::{iso_timestamp, print_summary, EpochProgress, JsonOutput, TrainingReport};

/// Arguments for the train command.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Dataset root containing `Drowsy/` and `Non Drowsy/`
    #[arg(value_name = "DATASET_DIR")]
    pub dataset: PathBuf,

    /// Number of passes over the training set [default: 50]
    #[arg(long)]
    pub epochs: Option<usize>,

    /// Samples per optimizer step [default: 32]
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Adam learning rate [default: 0.001]
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// L2 weight decay [default: 0.01]
    #[arg(long)]
    pub weight_decay: Option<f64>,

    /// Seed for the split and the per-epoch shuffle [default: 42]
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fraction of samples held out for evaluation [default: 0.2]
    #[arg(long, value_parser = parse_fraction)]
    pub test_fraction: Option<f64>,

    /// Memoize landmark features per image across epochs
    #[arg(long)]
    pub cache_features: bool,

    /// Write the trained weights to this safetensors file
    #[arg(long, value_name = "FILE")]
    pub save_weights: Option<PathBuf>,

    /// Write a JSON training report to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,

    /// Force progress bar even when not a TTY
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress and the confusion matrix
    #[arg(short, long)]
    pub quiet: bool,

    /// Directory holding the face model weights
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,
}

impl TrainArgs {
    /// Fill unset arguments from the config file.
    ///
    /// CLI arguments win; config values only apply where the flag was not given.
    #[must_use]
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        let t = &config.training;
        args.epochs = args.epochs.or(t.epochs);
        args.batch_size = args.batch_size.or(t.batch_size);
        args.learning_rate = args.learning_rate.or(t.learning_rate);
        args.weight_decay = args.weight_decay.or(t.weight_decay);
        args.seed = args.seed.or(t.seed);
        args.test_fraction = args.test_fraction.or(t.test_fraction);

        if !args.cache_features {
            args.cache_features = config.dataset.cache_features.unwrap_or(false);
        }
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }
        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }
        args
    }

    /// Hyperparameters with defaults for anything unset.
    #[must_use]
    pub fn training_config(&self) -> TrainingConfig {
        let defaults = TrainingConfig::default();
        TrainingConfig {
            epochs: self.epochs.unwrap_or(defaults.epochs),
            batch_size: self.batch_size.unwrap_or(defaults.batch_size),
            learning_rate: self.learning_rate.unwrap_or(defaults.learning_rate),
            weight_decay: self.weight_decay.unwrap_or(defaults.weight_decay),
            seed: self.seed.unwrap_or(defaults.seed),
        }
    }

    fn test_fraction(&self) -> f64 {
        self.test_fraction.unwrap_or(DEFAULT_TEST_FRACTION)
    }
}

/// Run the train command.
///
/// Expects `args` to have been processed through `with_config()` first.
pub fn run(args: &TrainArgs) -> Result<()> {
    let config = args.training_config();
    config.validate()?;

    let device = get_device();
    info!("Using device: {device:?}");

    let (train_samples, test_samples) =
        load_split(&args.dataset, args.test_fraction(), config.seed)?;
    let (n_train, n_test) = (train_samples.len(), test_samples.len());
    info!("Training on {n_train} samples, testing on {n_test}");

    let store = model_store(args.models_dir.as_ref());
    let pipeline = build_pipeline(&store, &device, args.cache_features)?;
    let train_set = DrowsinessDataset::from_samples(train_samples, pipeline.clone());
    let test_set = DrowsinessDataset::from_samples(test_samples, pipeline);

    let (model, varmap) = DrowsinessNet::trainable(&device)?;
    let show_bar = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress = EpochProgress::new(args.quiet, show_bar);

    let history = train(&model, &varmap, &train_set, &config, &device, &progress)?;
    let evaluation = evaluate(&model, &test_set, config.batch_size, &device)?;

    print_summary(&evaluation, args.quiet);

    if let Some(path) = &args.save_weights {
        varmap
            .save(path)
            .with_context(|| format!("Failed to save weights to {}", path.display()))?;
        info!("Saved weights to {}", path.display());
    }

    if let Some(path) = &args.report {
        let report = TrainingReport {
            timestamp: iso_timestamp(),
            dataset: args.dataset.clone(),
            hyperparameters: config,
            test_fraction: args.test_fraction(),
            train_samples: n_train,
            test_samples: n_test,
            epoch_losses: history.epoch_losses,
            accuracy: evaluation.accuracy,
            confusion_matrix: evaluation.confusion_matrix(),
        };
        JsonOutput::create(path)?.write_value(&report, args.pretty)?;
    }

    Ok(())
}
